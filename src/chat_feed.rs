// src/chat_feed.rs
//! The all-staff chat feed, independent of any request.
use crate::error::ServiceError;
use crate::models::message::{ChatMessage, ChatPosted};
use crate::store::ChatStore;

pub const DEFAULT_FEED_LIMIT: i64 = 100;

pub struct ChatFeed<'a, S: ChatStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ChatStore + ?Sized> ChatFeed<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The latest `limit` messages (default 100), returned oldest first.
    ///
    /// The store is asked for the newest page, which is then reversed so the
    /// window reads chronologically. The limit has no upper bound.
    pub async fn list_recent(&self, limit: Option<i64>) -> Result<Vec<ChatMessage>, ServiceError> {
        let limit = limit.unwrap_or(DEFAULT_FEED_LIMIT);
        if limit < 0 {
            return Err(ServiceError::MalformedInput(
                "limit must not be negative".to_string(),
            ));
        }

        let mut messages = self.store.latest_chat_messages(limit).await?;
        messages.reverse();

        tracing::debug!(limit, count = messages.len(), "listed chat feed");
        Ok(messages)
    }

    /// Posts a trimmed message. Blank bodies are rejected before the store is touched.
    pub async fn post_message(&self, author_id: i32, body: &str) -> Result<ChatPosted, ServiceError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ServiceError::MalformedInput(
                "Message cannot be empty".to_string(),
            ));
        }

        let posted = self.store.insert_chat_message(author_id, body).await?;
        tracing::info!(message_id = posted.id, author_id, "chat message posted");
        Ok(posted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::memory::fixtures::seed_employee;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_limit_keeps_latest_window_oldest_first() {
        let store = MemoryStore::new();
        let author = seed_employee(&store).await;
        let feed = ChatFeed::new(&store);

        for body in ["A", "B", "C"] {
            feed.post_message(author, body).await.unwrap();
        }

        let window = feed.list_recent(Some(2)).await.unwrap();
        assert_eq!(
            window.iter().map(|m| m.body.as_str()).collect::<Vec<_>>(),
            vec!["B", "C"]
        );
    }

    #[tokio::test]
    async fn test_fewer_than_limit_returns_all_in_order() {
        let store = MemoryStore::new();
        let author = seed_employee(&store).await;
        let feed = ChatFeed::new(&store);

        feed.post_message(author, "first").await.unwrap();
        feed.post_message(author, "second").await.unwrap();

        let all = feed.list_recent(None).await.unwrap();
        assert_eq!(
            all.iter().map(|m| m.body.as_str()).collect::<Vec<_>>(),
            vec!["first", "second"]
        );
        assert_eq!(all[0].author_username.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_body_is_trimmed_and_blank_rejected() {
        let store = MemoryStore::new();
        let author = seed_employee(&store).await;
        let feed = ChatFeed::new(&store);

        let err = feed.post_message(author, "   \n\t ").await.unwrap_err();
        assert!(matches!(err, ServiceError::MalformedInput(_)));

        let posted = feed.post_message(author, "  hello team  ").await.unwrap();
        let messages = feed.list_recent(None).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, posted.id);
        assert_eq!(messages[0].body, "hello team");
        assert_eq!(messages[0].created_at, posted.created_at);
    }

    #[tokio::test]
    async fn test_blank_body_never_reaches_store() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let err = ChatFeed::new(&store).post_message(1, "").await.unwrap_err();
        assert!(matches!(err, ServiceError::MalformedInput(_)));
    }

    #[tokio::test]
    async fn test_unknown_author_is_rejected_by_store() {
        let store = MemoryStore::new();
        let err = ChatFeed::new(&store)
            .post_message(42, "hi")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Store(StoreError::ReferentialViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_zero_and_negative_limits() {
        let store = MemoryStore::new();
        let author = seed_employee(&store).await;
        let feed = ChatFeed::new(&store);
        feed.post_message(author, "x").await.unwrap();

        assert!(feed.list_recent(Some(0)).await.unwrap().is_empty());
        assert!(matches!(
            feed.list_recent(Some(-1)).await,
            Err(ServiceError::MalformedInput(_))
        ));
    }
}
