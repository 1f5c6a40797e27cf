// lib.rs - Helpdesk backend: request ledger, request threads and staff chat
pub mod chat_feed;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod middleware;
pub mod models;
pub mod state;
pub mod store;
pub mod thread;

pub use error::{ServiceError, StoreError};
pub use state::AppState;
