use crate::error::ServiceError;
use crate::middleware::auth::{acting_user_id, auth_middleware};
use crate::models::auth::Claims;
use crate::models::message::*;
use crate::models::request::CreatedResponse;
use crate::thread::ThreadService;
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

pub fn thread_routes() -> Router {
    Router::new()
        .route(
            "/api/request-messages",
            get(list_thread).post(post_thread_message),
        )
        .layer(axum::middleware::from_fn(auth_middleware))
}

async fn list_thread(
    Extension(state): Extension<Arc<AppState>>,
    WithRejection(Query(params), _): WithRejection<Query<ThreadQuery>, ServiceError>,
) -> Result<Json<ThreadResponse>, ServiceError> {
    let messages = ThreadService::new(state.store.as_ref())
        .list_messages(params.request_id)
        .await?;

    Ok(Json(ThreadResponse {
        success: true,
        messages,
    }))
}

async fn post_thread_message(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(payload), _): WithRejection<Json<PostThreadMessagePayload>, ServiceError>,
) -> Result<(StatusCode, Json<CreatedResponse>), ServiceError> {
    let author_id = acting_user_id(&claims)?;

    let id = ThreadService::new(state.store.as_ref())
        .post_message(
            payload.request_id,
            author_id,
            payload.message,
            payload.is_admin_reply,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            success: true,
            id,
            message: "Message sent".to_string(),
        }),
    ))
}
