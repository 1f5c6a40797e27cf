// src/state.rs
use crate::config::AppConfig;
use crate::store::Store;
use std::sync::Arc;

/// Shared across handlers through an `Extension<Arc<AppState>>` layer.
/// Holds no request data of its own; everything lives in the store.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        Self { store, config }
    }
}
