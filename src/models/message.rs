use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One entry in a request's thread.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestMessage {
    pub id: i32,
    pub request_id: i32,
    pub author_id: Option<i32>,
    pub body: String,
    pub is_admin_reply: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub author_name: Option<String>,
    pub author_role: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRequestMessage {
    pub request_id: i32,
    pub author_id: i32,
    pub body: String,
    pub is_admin_reply: bool,
}

/// One entry in the all-staff chat feed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: i32,
    pub author_id: Option<i32>,
    pub body: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub author_name: Option<String>,
    pub author_username: Option<String>,
    pub author_role: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatPosted {
    pub id: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadQuery {
    pub request_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostThreadMessagePayload {
    pub request_id: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub is_admin_reply: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatFeedQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PostChatMessagePayload {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadResponse {
    pub success: bool,
    pub messages: Vec<RequestMessage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatFeedResponse {
    pub success: bool,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPostedResponse {
    pub success: bool,
    pub id: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub message: String,
}
