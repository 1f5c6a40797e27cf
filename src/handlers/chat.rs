// src/handlers/chat.rs
use crate::chat_feed::ChatFeed;
use crate::error::ServiceError;
use crate::middleware::auth::{acting_user_id, auth_middleware};
use crate::models::auth::Claims;
use crate::models::message::*;
use crate::AppState;
use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use axum_extra::extract::WithRejection;
use std::sync::Arc;

pub fn chat_routes() -> Router {
    Router::new()
        .route("/api/chat/messages", get(get_chat_feed).post(post_chat_message))
        .layer(axum::middleware::from_fn(auth_middleware))
}

async fn get_chat_feed(
    Extension(state): Extension<Arc<AppState>>,
    WithRejection(Query(params), _): WithRejection<Query<ChatFeedQuery>, ServiceError>,
) -> Result<Json<ChatFeedResponse>, ServiceError> {
    let messages = ChatFeed::new(state.store.as_ref())
        .list_recent(params.limit)
        .await?;

    Ok(Json(ChatFeedResponse {
        success: true,
        messages,
    }))
}

async fn post_chat_message(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(payload), _): WithRejection<Json<PostChatMessagePayload>, ServiceError>,
) -> Result<(StatusCode, Json<ChatPostedResponse>), ServiceError> {
    let author_id = acting_user_id(&claims)?;

    let posted = ChatFeed::new(state.store.as_ref())
        .post_message(author_id, &payload.message)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ChatPostedResponse {
            success: true,
            id: posted.id,
            created_at: posted.created_at,
            message: "Message sent".to_string(),
        }),
    ))
}
