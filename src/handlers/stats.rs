use crate::error::ServiceError;
use crate::middleware::admin::admin_middleware;
use crate::middleware::auth::auth_middleware;
use crate::models::stats::StatsResponse;
use crate::store::StatsStore;
use crate::AppState;
use axum::{extract::Extension, response::Json, routing::get, Router};
use std::sync::Arc;

pub fn stats_routes() -> Router {
    Router::new()
        .route("/api/stats", get(get_stats))
        .layer(axum::middleware::from_fn(admin_middleware))
        .layer(axum::middleware::from_fn(auth_middleware))
}

async fn get_stats(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<StatsResponse>, ServiceError> {
    let stats = state.store.request_stats().await?;

    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}
