// src/store/memory.rs
use super::{
    ChatStore, RequestStore, StatsStore, Store, StoreResult, ThreadStore, UserStore,
};
use crate::error::StoreError;
use crate::models::auth::{NewUser, User};
use crate::models::message::{ChatMessage, ChatPosted, NewRequestMessage, RequestMessage};
use crate::models::request::{
    NewRequest, Request, RequestStatus, StatusTransition, StatusUpdate,
};
use crate::models::stats::RequestStats;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

type Timestamp = DateTime<Utc>;

#[derive(Debug, Clone)]
struct RequestRow {
    id: i32,
    user_id: Option<i32>,
    title: String,
    description: String,
    status: String,
    priority: String,
    created_at: Timestamp,
    updated_at: Timestamp,
}

#[derive(Debug, Clone)]
struct RequestMessageRow {
    id: i32,
    request_id: i32,
    user_id: Option<i32>,
    body: String,
    is_admin_reply: bool,
    created_at: Timestamp,
}

#[derive(Debug, Clone)]
struct ChatMessageRow {
    id: i32,
    user_id: Option<i32>,
    body: String,
    created_at: Timestamp,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    requests: BTreeMap<i32, RequestRow>,
    request_messages: Vec<RequestMessageRow>,
    chat_messages: Vec<ChatMessageRow>,
    last_id: i32,
    last_tick: Option<Timestamp>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    /// Store clock. Strictly increasing at microsecond resolution, like a
    /// Postgres `timestamptz`.
    fn now(&mut self) -> Timestamp {
        let now = Utc::now();
        let tick = match self.last_tick {
            Some(last) if last >= now => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_tick = Some(tick);
        tick
    }

    fn user_exists(&self, user_id: i32) -> bool {
        self.users.contains_key(&user_id)
    }
}

/// In-process store with the same ordering, clock and referential rules as
/// the Postgres schema. Ids come from one shared sequence.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail as if the database were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "memory store is offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn list_requests(&self) -> StoreResult<Vec<Request>> {
        self.ensure_online()?;
        let tables = self.tables.read().await;

        let mut requests: Vec<Request> = tables
            .requests
            .values()
            .map(|row| {
                let author = row.user_id.and_then(|id| tables.users.get(&id));
                Request {
                    id: row.id,
                    title: row.title.clone(),
                    description: row.description.clone(),
                    status: row.status.clone(),
                    priority: row.priority.clone(),
                    created_by: row.user_id,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                    author_name: author.map(|u| u.full_name.clone()),
                    author_username: author.map(|u| u.username.clone()),
                }
            })
            .collect();

        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(requests)
    }

    async fn insert_request(&self, request: &NewRequest) -> StoreResult<i32> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;

        if !tables.user_exists(request.author_id) {
            return Err(StoreError::ReferentialViolation(format!(
                "user {} does not exist",
                request.author_id
            )));
        }

        let id = tables.next_id();
        let now = tables.now();
        tables.requests.insert(
            id,
            RequestRow {
                id,
                user_id: Some(request.author_id),
                title: request.title.clone(),
                description: request.description.clone(),
                status: request.status.as_str().to_string(),
                priority: request.priority.as_str().to_string(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn update_request_status(
        &self,
        request_id: i32,
        status: &str,
    ) -> StoreResult<StatusUpdate> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;

        let now = tables.now();
        let rows_affected = match tables.requests.get_mut(&request_id) {
            Some(row) => {
                row.status = status.to_string();
                row.updated_at = now;
                1
            }
            None => 0,
        };
        Ok(StatusUpdate { rows_affected })
    }

    async fn transition_request_status(
        &self,
        request_id: i32,
        status: &str,
        allowed_from: &[&str],
    ) -> StoreResult<StatusTransition> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;

        let now = tables.now();
        let Some(row) = tables.requests.get_mut(&request_id) else {
            return Ok(StatusTransition::Missing);
        };
        if !allowed_from.contains(&row.status.as_str()) {
            return Ok(StatusTransition::Rejected {
                current: row.status.clone(),
            });
        }

        row.status = status.to_string();
        row.updated_at = now;
        Ok(StatusTransition::Applied)
    }
}

#[async_trait]
impl ThreadStore for MemoryStore {
    async fn list_request_messages(&self, request_id: i32) -> StoreResult<Vec<RequestMessage>> {
        self.ensure_online()?;
        let tables = self.tables.read().await;

        let mut messages: Vec<RequestMessage> = tables
            .request_messages
            .iter()
            .filter(|row| row.request_id == request_id)
            .map(|row| {
                let author = row.user_id.and_then(|id| tables.users.get(&id));
                RequestMessage {
                    id: row.id,
                    request_id: row.request_id,
                    author_id: row.user_id,
                    body: row.body.clone(),
                    is_admin_reply: row.is_admin_reply,
                    created_at: row.created_at,
                    author_name: author.map(|u| u.full_name.clone()),
                    author_role: author.map(|u| u.role.clone()),
                }
            })
            .collect();

        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(messages)
    }

    async fn insert_request_message(&self, message: &NewRequestMessage) -> StoreResult<i32> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;

        if !tables.requests.contains_key(&message.request_id) {
            return Err(StoreError::ReferentialViolation(format!(
                "request {} does not exist",
                message.request_id
            )));
        }
        if !tables.user_exists(message.author_id) {
            return Err(StoreError::ReferentialViolation(format!(
                "user {} does not exist",
                message.author_id
            )));
        }

        let id = tables.next_id();
        let created_at = tables.now();
        tables.request_messages.push(RequestMessageRow {
            id,
            request_id: message.request_id,
            user_id: Some(message.author_id),
            body: message.body.clone(),
            is_admin_reply: message.is_admin_reply,
            created_at,
        });
        Ok(id)
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn latest_chat_messages(&self, limit: i64) -> StoreResult<Vec<ChatMessage>> {
        self.ensure_online()?;
        let tables = self.tables.read().await;

        let mut rows: Vec<&ChatMessageRow> = tables.chat_messages.iter().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .take(limit)
            .map(|row| {
                let author = row.user_id.and_then(|id| tables.users.get(&id));
                ChatMessage {
                    id: row.id,
                    author_id: row.user_id,
                    body: row.body.clone(),
                    created_at: row.created_at,
                    author_name: author.map(|u| u.full_name.clone()),
                    author_username: author.map(|u| u.username.clone()),
                    author_role: author.map(|u| u.role.clone()),
                }
            })
            .collect())
    }

    async fn insert_chat_message(&self, author_id: i32, body: &str) -> StoreResult<ChatPosted> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;

        if !tables.user_exists(author_id) {
            return Err(StoreError::ReferentialViolation(format!(
                "user {} does not exist",
                author_id
            )));
        }

        let id = tables.next_id();
        let created_at = tables.now();
        tables.chat_messages.push(ChatMessageRow {
            id,
            user_id: Some(author_id),
            body: body.to_string(),
            created_at,
        });
        Ok(ChatPosted { id, created_at })
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.ensure_online()?;
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_user_by_id(&self, user_id: i32) -> StoreResult<Option<User>> {
        self.ensure_online()?;
        let tables = self.tables.read().await;
        Ok(tables.users.get(&user_id).cloned())
    }

    async fn insert_user(&self, user: &NewUser) -> StoreResult<i32> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!(
                "username {} already taken",
                user.username
            )));
        }

        let id = tables.next_id();
        let created_at = tables.now();
        tables.users.insert(
            id,
            User {
                id,
                username: user.username.clone(),
                full_name: user.full_name.clone(),
                password_hash: user.password_hash.clone(),
                role: user.role.clone(),
                created_at,
            },
        );
        Ok(id)
    }

    async fn delete_user(&self, user_id: i32) -> StoreResult<bool> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;

        if tables.users.remove(&user_id).is_none() {
            return Ok(false);
        }

        // ON DELETE SET NULL
        let detach = |owner: &mut Option<i32>| {
            if *owner == Some(user_id) {
                *owner = None;
            }
        };
        tables
            .requests
            .values_mut()
            .for_each(|row| detach(&mut row.user_id));
        tables
            .request_messages
            .iter_mut()
            .for_each(|row| detach(&mut row.user_id));
        tables
            .chat_messages
            .iter_mut()
            .for_each(|row| detach(&mut row.user_id));
        Ok(true)
    }
}

#[async_trait]
impl StatsStore for MemoryStore {
    async fn request_stats(&self) -> StoreResult<RequestStats> {
        self.ensure_online()?;
        let tables = self.tables.read().await;

        let mut stats = RequestStats {
            total_users: tables.users.len() as i64,
            total_requests: tables.requests.len() as i64,
            ..RequestStats::default()
        };
        for row in tables.requests.values() {
            *stats.status_breakdown.entry(row.status.clone()).or_insert(0) += 1;
            *stats
                .priority_breakdown
                .entry(row.priority.clone())
                .or_insert(0) += 1;
        }
        stats.pending_requests = stats
            .status_breakdown
            .get(RequestStatus::PENDING)
            .copied()
            .unwrap_or(0);
        stats.resolved_requests = stats
            .status_breakdown
            .get(RequestStatus::RESOLVED)
            .copied()
            .unwrap_or(0);
        Ok(stats)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.ensure_online()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::models::auth::{ROLE_ADMIN, ROLE_EMPLOYEE};

    pub async fn seed_user(store: &MemoryStore, username: &str, role: &str) -> i32 {
        store
            .insert_user(&NewUser {
                username: username.to_string(),
                full_name: format!("{} Full", username),
                password_hash: String::new(),
                role: role.to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn seed_employee(store: &MemoryStore) -> i32 {
        seed_user(store, "alice", ROLE_EMPLOYEE).await
    }

    pub async fn seed_admin(store: &MemoryStore) -> i32 {
        seed_user(store, "satoru", ROLE_ADMIN).await
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::models::request::Priority;

    #[tokio::test]
    async fn test_deleting_author_keeps_rows_readable() {
        let store = MemoryStore::new();
        let author = seed_employee(&store).await;
        let request_id = store
            .insert_request(&NewRequest {
                author_id: author,
                title: "VPN".into(),
                description: "cannot connect".into(),
                status: RequestStatus::pending(),
                priority: Priority::Low,
            })
            .await
            .unwrap();
        store.insert_chat_message(author, "hello").await.unwrap();

        assert!(store.delete_user(author).await.unwrap());

        let requests = store.list_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].id, request_id);
        assert_eq!(requests[0].created_by, None);
        assert_eq!(requests[0].author_name, None);

        let chat = store.latest_chat_messages(10).await.unwrap();
        assert_eq!(chat[0].author_id, None);
        assert_eq!(chat[0].author_username, None);
    }

    #[tokio::test]
    async fn test_guarded_transition_outcomes() {
        let store = MemoryStore::new();
        let author = seed_employee(&store).await;
        let request_id = store
            .insert_request(&NewRequest {
                author_id: author,
                title: "Printer".into(),
                description: "jammed".into(),
                status: RequestStatus::pending(),
                priority: Priority::Medium,
            })
            .await
            .unwrap();
        let before = store.list_requests().await.unwrap()[0].updated_at;

        let rejected = store
            .transition_request_status(request_id, "resolved", &["in_progress"])
            .await
            .unwrap();
        assert_eq!(
            rejected,
            StatusTransition::Rejected {
                current: "pending".to_string()
            }
        );
        assert_eq!(store.list_requests().await.unwrap()[0].updated_at, before);

        let applied = store
            .transition_request_status(request_id, "resolved", &["pending"])
            .await
            .unwrap();
        assert_eq!(applied, StatusTransition::Applied);
        let after = &store.list_requests().await.unwrap()[0];
        assert_eq!(after.status, "resolved");
        assert!(after.updated_at > before);

        let missing = store
            .transition_request_status(request_id + 99, "resolved", &["pending"])
            .await
            .unwrap();
        assert_eq!(missing, StatusTransition::Missing);
    }

    #[tokio::test]
    async fn test_store_clock_is_strictly_increasing() {
        let store = MemoryStore::new();
        let author = seed_employee(&store).await;
        let mut stamps = Vec::new();
        for body in ["a", "b", "c", "d"] {
            stamps.push(store.insert_chat_message(author, body).await.unwrap().created_at);
        }
        assert!(stamps.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[tokio::test]
    async fn test_offline_store_reports_unavailable() {
        let store = MemoryStore::new();
        store.set_offline(true);
        assert!(matches!(
            store.list_requests().await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.health_check().await.is_err());

        store.set_offline(false);
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        seed_employee(&store).await;
        let err = store
            .insert_user(&NewUser {
                username: "alice".into(),
                full_name: String::new(),
                password_hash: String::new(),
                role: "employee".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
