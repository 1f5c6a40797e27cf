use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// A support request with the author's display fields joined in at read time.
/// `created_by` and the author fields are `None` once the author has been removed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub created_by: Option<i32>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub author_name: Option<String>,
    pub author_username: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRequest {
    pub author_id: i32,
    pub title: String,
    pub description: String,
    pub status: RequestStatus,
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// Request status. Stored and compared as opaque text; the constants name the
/// values the usual workflow moves through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestStatus(String);

impl RequestStatus {
    pub const PENDING: &'static str = "pending";
    pub const IN_PROGRESS: &'static str = "in_progress";
    pub const RESOLVED: &'static str = "resolved";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn pending() -> Self {
        Self::new(Self::PENDING)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_known(&self) -> bool {
        matches!(
            self.0.as_str(),
            Self::PENDING | Self::IN_PROGRESS | Self::RESOLVED
        )
    }
}

impl Default for RequestStatus {
    fn default() -> Self {
        Self::pending()
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a status update. Zero rows means the id matched nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    pub rows_affected: u64,
}

impl StatusUpdate {
    pub fn matched(&self) -> bool {
        self.rows_affected > 0
    }
}

/// Outcome of a guarded status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusTransition {
    Applied,
    /// No request with that id.
    Missing,
    /// The request exists but its current status is not an allowed source.
    Rejected { current: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Option<String>,
    // A client-sent `status` is dropped here; new requests always start pending.
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    pub id: i32,
    pub status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestListResponse {
    pub success: bool,
    pub requests: Vec<Request>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub success: bool,
    pub id: i32,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateResponse {
    pub success: bool,
    pub updated: bool,
    pub message: String,
}
