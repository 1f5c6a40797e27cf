// src/handlers/mod.rs
pub mod auth;
pub mod chat;
pub mod messages;
pub mod requests;
pub mod stats;
pub mod status;


use crate::middleware::logging::request_logging_middleware;
use crate::AppState;
use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Full HTTP surface with shared state and cross-cutting layers attached.
pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(status::status_routes())
        .merge(auth::auth_routes())
        .merge(requests::request_routes())
        .merge(messages::thread_routes())
        .merge(chat::chat_routes())
        .merge(stats::stats_routes())
        .layer(axum::middleware::from_fn(request_logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}
