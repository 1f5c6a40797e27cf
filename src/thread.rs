// src/thread.rs
//! Per-request message threads.
use crate::error::ServiceError;
use crate::models::message::{NewRequestMessage, RequestMessage};
use crate::store::ThreadStore;

pub struct ThreadService<'a, S: ThreadStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ThreadStore + ?Sized> ThreadService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Thread of one request, oldest first. A missing `request_id` is a
    /// malformed call; a request without messages yields an empty list.
    pub async fn list_messages(
        &self,
        request_id: Option<i32>,
    ) -> Result<Vec<RequestMessage>, ServiceError> {
        let request_id = request_id
            .ok_or_else(|| ServiceError::MalformedInput("requestId is required".to_string()))?;

        let messages = self.store.list_request_messages(request_id).await?;
        tracing::debug!(request_id, count = messages.len(), "listed thread messages");
        Ok(messages)
    }

    /// Appends a message to a request's thread.
    ///
    /// The body is stored as given, empty included. `is_admin_reply` is a
    /// display hint supplied by the caller and is not checked against the
    /// author's role.
    pub async fn post_message(
        &self,
        request_id: i32,
        author_id: i32,
        body: String,
        is_admin_reply: bool,
    ) -> Result<i32, ServiceError> {
        let message = NewRequestMessage {
            request_id,
            author_id,
            body,
            is_admin_reply,
        };
        let id = self.store.insert_request_message(&message).await?;

        tracing::info!(
            message_id = id,
            request_id,
            author_id,
            is_admin_reply,
            "thread message posted"
        );
        Ok(id)
    }
}
