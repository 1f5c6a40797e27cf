use crate::store::Store;
use crate::AppState;
use axum::{extract::Extension, response::Json, routing::get, Router};
use serde_json::json;
use std::sync::Arc;

pub fn status_routes() -> Router {
    Router::new().route("/api/status", get(api_status))
}

async fn api_status(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    let db_status = match state.store.health_check().await {
        Ok(()) => "healthy",
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            "unhealthy"
        }
    };

    Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "database": db_status,
            "backend": state.store.backend_name(),
        },
        "endpoints": {
            "auth": "/api/auth/*",
            "requests": "/api/requests",
            "request_messages": "/api/request-messages",
            "chat": "/api/chat/messages",
            "stats": "/api/stats"
        }
    }))
}
