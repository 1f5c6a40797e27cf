use crate::error::ServiceError;
use crate::ledger::RequestLedger;
use crate::middleware::auth::{acting_user_id, auth_middleware};
use crate::models::auth::Claims;
use crate::models::request::*;
use crate::store::Store;
use crate::AppState;
use axum::{
    extract::Extension,
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use axum_extra::extract::WithRejection;
use std::sync::Arc;

pub fn request_routes() -> Router {
    Router::new()
        .route(
            "/api/requests",
            get(list_requests).post(create_request).put(update_status),
        )
        .layer(axum::middleware::from_fn(auth_middleware))
}

fn ledger(state: &AppState) -> RequestLedger<'_, dyn Store> {
    RequestLedger::new(state.store.as_ref()).with_policy(state.config.status_policy)
}

async fn list_requests(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<RequestListResponse>, ServiceError> {
    let requests = ledger(&state).list_requests().await?;

    Ok(Json(RequestListResponse {
        success: true,
        requests,
    }))
}

async fn create_request(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateRequestPayload>, ServiceError>,
) -> Result<(StatusCode, Json<CreatedResponse>), ServiceError> {
    let author_id = acting_user_id(&claims)?;

    let id = ledger(&state)
        .create_request(
            author_id,
            payload.title,
            payload.description,
            payload.priority.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            success: true,
            id,
            message: "Request created".to_string(),
        }),
    ))
}

async fn update_status(
    Extension(state): Extension<Arc<AppState>>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateStatusPayload>, ServiceError>,
) -> Result<Json<StatusUpdateResponse>, ServiceError> {
    let update = ledger(&state)
        .update_status(payload.id, &payload.status)
        .await?;

    Ok(Json(StatusUpdateResponse {
        success: true,
        updated: update.matched(),
        message: "Request updated".to_string(),
    }))
}
