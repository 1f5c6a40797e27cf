// src/store/mod.rs
//! Persistence seam. Every core operation reaches the database through one of
//! these traits, so the ledger, thread service and chat feed never hold state
//! of their own and can run against [`MemoryStore`] in tests.
use crate::error::StoreError;
use crate::models::auth::{NewUser, User};
use crate::models::message::{ChatMessage, ChatPosted, NewRequestMessage, RequestMessage};
use crate::models::request::{NewRequest, Request, StatusTransition, StatusUpdate};
use crate::models::stats::RequestStats;
use async_trait::async_trait;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait RequestStore: Send + Sync {
    /// All requests, newest first (ties broken by descending id).
    async fn list_requests(&self) -> StoreResult<Vec<Request>>;

    async fn insert_request(&self, request: &NewRequest) -> StoreResult<i32>;

    /// Sets the status and bumps `updated_at` in a single statement.
    async fn update_request_status(&self, request_id: i32, status: &str)
        -> StoreResult<StatusUpdate>;

    /// Like [`update_request_status`](Self::update_request_status), but only when the
    /// current status is one of `allowed_from`. The read and the write happen atomically.
    async fn transition_request_status(
        &self,
        request_id: i32,
        status: &str,
        allowed_from: &[&str],
    ) -> StoreResult<StatusTransition>;
}

#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Messages of one request, oldest first (ties broken by ascending id).
    async fn list_request_messages(&self, request_id: i32) -> StoreResult<Vec<RequestMessage>>;

    async fn insert_request_message(&self, message: &NewRequestMessage) -> StoreResult<i32>;
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    /// The latest `limit` chat messages, newest first.
    async fn latest_chat_messages(&self, limit: i64) -> StoreResult<Vec<ChatMessage>>;

    async fn insert_chat_message(&self, author_id: i32, body: &str) -> StoreResult<ChatPosted>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_id(&self, user_id: i32) -> StoreResult<Option<User>>;

    async fn insert_user(&self, user: &NewUser) -> StoreResult<i32>;

    async fn delete_user(&self, user_id: i32) -> StoreResult<bool>;
}

#[async_trait]
pub trait StatsStore: Send + Sync {
    async fn request_stats(&self) -> StoreResult<RequestStats>;
}

#[async_trait]
pub trait Store: RequestStore + ThreadStore + ChatStore + UserStore + StatsStore {
    fn backend_name(&self) -> &'static str;

    async fn health_check(&self) -> StoreResult<()>;
}
