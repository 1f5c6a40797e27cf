// src/ledger.rs
//! Request ledger: creation, listing and status changes of support requests.
use crate::error::ServiceError;
use crate::models::request::{
    NewRequest, Priority, Request, RequestStatus, StatusTransition, StatusUpdate,
};
use crate::store::RequestStore;

/// Which status changes the ledger accepts.
///
/// `Open` is the default and persists any string as-is. `Workflow` restricts
/// changes to the usual `pending -> in_progress -> resolved` path (with reopening
/// and re-applying the current status allowed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    #[default]
    Open,
    Workflow,
}

impl StatusPolicy {
    pub fn permits(&self, from: &str, to: &str) -> bool {
        match self {
            StatusPolicy::Open => true,
            StatusPolicy::Workflow => {
                from == to
                    || matches!(
                        (from, to),
                        (RequestStatus::PENDING, RequestStatus::IN_PROGRESS)
                            | (RequestStatus::PENDING, RequestStatus::RESOLVED)
                            | (RequestStatus::IN_PROGRESS, RequestStatus::RESOLVED)
                            | (RequestStatus::RESOLVED, RequestStatus::IN_PROGRESS)
                    )
            }
        }
    }

    /// Every status `to` may be reached from: the known statuses the policy
    /// permits, plus `to` itself.
    pub fn allowed_sources<'s>(&self, to: &'s str) -> Vec<&'s str> {
        let mut sources: Vec<&'s str> = [
            RequestStatus::PENDING,
            RequestStatus::IN_PROGRESS,
            RequestStatus::RESOLVED,
        ]
        .into_iter()
        .filter(|from| self.permits(from, to))
        .collect();
        if !sources.contains(&to) {
            sources.push(to);
        }
        sources
    }
}

pub struct RequestLedger<'a, S: RequestStore + ?Sized> {
    store: &'a S,
    policy: StatusPolicy,
}

impl<'a, S: RequestStore + ?Sized> RequestLedger<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            policy: StatusPolicy::Open,
        }
    }

    pub fn with_policy(mut self, policy: StatusPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn list_requests(&self) -> Result<Vec<Request>, ServiceError> {
        let requests = self.store.list_requests().await?;
        tracing::debug!(count = requests.len(), "listed requests");
        Ok(requests)
    }

    /// Records a new request. The status always starts at `pending`; a missing
    /// priority defaults to `medium`.
    pub async fn create_request(
        &self,
        author_id: i32,
        title: String,
        description: String,
        priority: Option<&str>,
    ) -> Result<i32, ServiceError> {
        let priority = match priority {
            None => Priority::default(),
            Some(value) => Priority::parse(value).ok_or_else(|| {
                ServiceError::MalformedInput(format!(
                    "priority must be one of low, medium, high (got '{}')",
                    value
                ))
            })?,
        };

        let request = NewRequest {
            author_id,
            title,
            description,
            status: RequestStatus::default(),
            priority,
        };
        let id = self.store.insert_request(&request).await?;

        tracing::info!(
            request_id = id,
            author_id,
            priority = priority.as_str(),
            "request created"
        );
        Ok(id)
    }

    /// Sets a new status and bumps `updated_at`. An unknown id is not an error:
    /// the returned [`StatusUpdate`] simply reports zero rows affected.
    pub async fn update_status(
        &self,
        request_id: i32,
        new_status: &str,
    ) -> Result<StatusUpdate, ServiceError> {
        let update = match self.policy {
            StatusPolicy::Open => {
                self.store
                    .update_request_status(request_id, new_status)
                    .await?
            }
            StatusPolicy::Workflow => {
                let allowed_from = self.policy.allowed_sources(new_status);
                match self
                    .store
                    .transition_request_status(request_id, new_status, &allowed_from)
                    .await?
                {
                    StatusTransition::Applied => StatusUpdate { rows_affected: 1 },
                    StatusTransition::Missing => StatusUpdate { rows_affected: 0 },
                    StatusTransition::Rejected { current } => {
                        return Err(ServiceError::InvalidTransition {
                            from: current,
                            to: new_status.to_string(),
                        });
                    }
                }
            }
        };

        if update.matched() {
            tracing::info!(request_id, status = new_status, "request status updated");
        } else {
            tracing::debug!(request_id, status = new_status, "status update matched no request");
        }
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat_feed::ChatFeed;
    use crate::error::StoreError;
    use crate::store::memory::fixtures::seed_employee;
    use crate::store::{MemoryStore, StoreResult};
    use crate::thread::ThreadService;
    use async_trait::async_trait;

    #[tokio::test]
    async fn test_new_request_is_listed_first_and_pending() {
        let store = MemoryStore::new();
        let author = seed_employee(&store).await;
        let ledger = RequestLedger::new(&store);

        let first = ledger
            .create_request(author, "Printer".into(), "jammed".into(), None)
            .await
            .unwrap();
        let second = ledger
            .create_request(author, "Laptop".into(), "broken screen".into(), Some("high"))
            .await
            .unwrap();

        let requests = ledger.list_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].id, second);
        assert_eq!(requests[1].id, first);
        assert_eq!(requests[0].status, "pending");
        assert_eq!(requests[0].priority, "high");
        assert_eq!(requests[1].priority, "medium");
        assert_eq!(requests[0].author_name.as_deref(), Some("alice Full"));
        assert_eq!(requests[0].author_username.as_deref(), Some("alice"));
        assert!(requests[0].updated_at >= requests[0].created_at);
    }

    #[tokio::test]
    async fn test_unknown_priority_is_malformed() {
        let store = MemoryStore::new();
        let author = seed_employee(&store).await;
        let err = RequestLedger::new(&store)
            .create_request(author, "t".into(), "d".into(), Some("urgent"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::MalformedInput(_)));
        assert!(store.list_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_unknown_author_is_referential_violation() {
        let store = MemoryStore::new();
        let err = RequestLedger::new(&store)
            .create_request(999, "t".into(), "d".into(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Store(StoreError::ReferentialViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_status_is_idempotent_and_bumps_updated_at() {
        let store = MemoryStore::new();
        let author = seed_employee(&store).await;
        let ledger = RequestLedger::new(&store);
        let id = ledger
            .create_request(author, "t".into(), "d".into(), None)
            .await
            .unwrap();
        let created = ledger.list_requests().await.unwrap()[0].clone();

        let first = ledger.update_status(id, "in_progress").await.unwrap();
        assert!(first.matched());
        let after_first = ledger.list_requests().await.unwrap()[0].clone();

        let second = ledger.update_status(id, "in_progress").await.unwrap();
        assert_eq!(second.rows_affected, 1);
        let after_second = ledger.list_requests().await.unwrap()[0].clone();

        assert_eq!(after_first.status, "in_progress");
        assert_eq!(after_second.status, "in_progress");
        assert_eq!(after_second.title, created.title);
        assert_eq!(after_second.created_at, created.created_at);
        assert!(after_first.updated_at > created.updated_at);
        assert!(after_second.updated_at > after_first.updated_at);
    }

    #[tokio::test]
    async fn test_only_status_changes_touch_updated_at() {
        let store = MemoryStore::new();
        let author = seed_employee(&store).await;
        let ledger = RequestLedger::new(&store);
        let id = ledger
            .create_request(author, "t".into(), "d".into(), None)
            .await
            .unwrap();
        let created = ledger.list_requests().await.unwrap()[0].clone();
        assert_eq!(created.updated_at, created.created_at);

        ledger
            .create_request(author, "other".into(), "d".into(), None)
            .await
            .unwrap();
        ThreadService::new(&store)
            .post_message(id, author, "ping".into(), false)
            .await
            .unwrap();
        ChatFeed::new(&store).post_message(author, "hi").await.unwrap();

        let requests = ledger.list_requests().await.unwrap();
        let untouched = requests.iter().find(|r| r.id == id).unwrap();
        assert_eq!(untouched.updated_at, created.updated_at);
        assert_eq!(untouched.status, "pending");
    }

    #[tokio::test]
    async fn test_unknown_status_is_persisted_verbatim() {
        let store = MemoryStore::new();
        let author = seed_employee(&store).await;
        let ledger = RequestLedger::new(&store);
        let id = ledger
            .create_request(author, "t".into(), "d".into(), None)
            .await
            .unwrap();

        ledger.update_status(id, "waiting on vendor").await.unwrap();
        assert_eq!(
            ledger.list_requests().await.unwrap()[0].status,
            "waiting on vendor"
        );
    }

    #[tokio::test]
    async fn test_update_of_missing_request_is_silent_noop() {
        let store = MemoryStore::new();
        let author = seed_employee(&store).await;
        let ledger = RequestLedger::new(&store);
        let id = ledger
            .create_request(author, "t".into(), "d".into(), None)
            .await
            .unwrap();
        let before = ledger.list_requests().await.unwrap();

        let update = ledger.update_status(id + 100, "resolved").await.unwrap();
        assert!(!update.matched());
        assert_eq!(ledger.list_requests().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_workflow_policy_rejects_backwards_transition() {
        let store = MemoryStore::new();
        let author = seed_employee(&store).await;
        let ledger = RequestLedger::new(&store).with_policy(StatusPolicy::Workflow);
        let id = ledger
            .create_request(author, "t".into(), "d".into(), None)
            .await
            .unwrap();

        ledger.update_status(id, "in_progress").await.unwrap();
        ledger.update_status(id, "resolved").await.unwrap();
        let err = ledger.update_status(id, "pending").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { .. }));

        // reapplying and reopening are allowed
        assert!(ledger.update_status(id, "resolved").await.unwrap().matched());
        assert!(ledger.update_status(id, "in_progress").await.unwrap().matched());
        // unknown ids stay a no-op under the workflow policy too
        assert!(!ledger.update_status(id + 1, "resolved").await.unwrap().matched());
    }

    /// Lets another writer resolve the request right before the guarded write.
    struct ConcurrentResolve {
        inner: MemoryStore,
    }

    #[async_trait]
    impl RequestStore for ConcurrentResolve {
        async fn list_requests(&self) -> StoreResult<Vec<Request>> {
            self.inner.list_requests().await
        }

        async fn insert_request(&self, request: &NewRequest) -> StoreResult<i32> {
            self.inner.insert_request(request).await
        }

        async fn update_request_status(
            &self,
            request_id: i32,
            status: &str,
        ) -> StoreResult<StatusUpdate> {
            self.inner.update_request_status(request_id, status).await
        }

        async fn transition_request_status(
            &self,
            request_id: i32,
            status: &str,
            allowed_from: &[&str],
        ) -> StoreResult<StatusTransition> {
            self.inner
                .update_request_status(request_id, RequestStatus::RESOLVED)
                .await?;
            self.inner
                .transition_request_status(request_id, status, allowed_from)
                .await
        }
    }

    #[tokio::test]
    async fn test_workflow_check_sees_concurrent_write() {
        let inner = MemoryStore::new();
        let author = seed_employee(&inner).await;
        let store = ConcurrentResolve { inner };
        let ledger = RequestLedger::new(&store).with_policy(StatusPolicy::Workflow);
        let id = ledger
            .create_request(author, "t".into(), "d".into(), None)
            .await
            .unwrap();

        // pending -> pending is allowed, but the request is resolved by then
        let err = ledger.update_status(id, "pending").await.unwrap_err();
        match err {
            ServiceError::InvalidTransition { from, to } => {
                assert_eq!(from, "resolved");
                assert_eq!(to, "pending");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(ledger.list_requests().await.unwrap()[0].status, "resolved");
    }

    #[tokio::test]
    async fn test_store_outage_propagates() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let err = RequestLedger::new(&store).list_requests().await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::Unavailable(_))));
    }

    #[test]
    fn test_policy_permits() {
        assert!(StatusPolicy::Open.permits("resolved", "anything"));
        assert!(StatusPolicy::Workflow.permits("pending", "in_progress"));
        assert!(!StatusPolicy::Workflow.permits("in_progress", "pending"));
        assert!(!StatusPolicy::Workflow.permits("pending", "closed"));
    }

    #[test]
    fn test_allowed_sources() {
        assert_eq!(
            StatusPolicy::Workflow.allowed_sources("resolved"),
            vec!["pending", "in_progress", "resolved"]
        );
        assert_eq!(
            StatusPolicy::Workflow.allowed_sources("pending"),
            vec!["pending"]
        );
        assert_eq!(StatusPolicy::Workflow.allowed_sources("closed"), vec!["closed"]);
    }
}
