// src/store/postgres.rs
use super::{
    ChatStore, RequestStore, StatsStore, Store, StoreResult, ThreadStore, UserStore,
};
use crate::models::auth::{NewUser, User};
use crate::models::message::{ChatMessage, ChatPosted, NewRequestMessage, RequestMessage};
use crate::models::request::{NewRequest, Request, RequestStatus, StatusTransition, StatusUpdate};
use crate::models::stats::RequestStats;
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::BTreeMap;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn grouped_counts(&self, column_sql: &str) -> StoreResult<BTreeMap<String, i64>> {
        let rows = sqlx::query_as::<_, (String, i64)>(column_sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }
}

#[async_trait]
impl RequestStore for PgStore {
    async fn list_requests(&self) -> StoreResult<Vec<Request>> {
        let requests = sqlx::query_as::<_, Request>(
            "SELECT r.id, r.title, r.description, r.status, r.priority,
                    r.user_id AS created_by, r.created_at, r.updated_at,
                    u.full_name AS author_name, u.username AS author_username
             FROM requests r
             LEFT JOIN users u ON r.user_id = u.id
             ORDER BY r.created_at DESC, r.id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn insert_request(&self, request: &NewRequest) -> StoreResult<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO requests (user_id, title, description, status, priority)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(request.author_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.status.as_str())
        .bind(request.priority.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_request_status(
        &self,
        request_id: i32,
        status: &str,
    ) -> StoreResult<StatusUpdate> {
        let result = sqlx::query(
            "UPDATE requests SET status = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(status)
        .bind(request_id)
        .execute(&self.pool)
        .await?;

        Ok(StatusUpdate {
            rows_affected: result.rows_affected(),
        })
    }

    async fn transition_request_status(
        &self,
        request_id: i32,
        status: &str,
        allowed_from: &[&str],
    ) -> StoreResult<StatusTransition> {
        let mut tx = self.pool.begin().await?;

        // Row lock keeps concurrent writers out until commit.
        let current = sqlx::query_scalar::<_, String>(
            "SELECT status FROM requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            tx.rollback().await?;
            return Ok(StatusTransition::Missing);
        };
        if !allowed_from.contains(&current.as_str()) {
            tx.rollback().await?;
            return Ok(StatusTransition::Rejected { current });
        }

        sqlx::query("UPDATE requests SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status)
            .bind(request_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(StatusTransition::Applied)
    }
}

#[async_trait]
impl ThreadStore for PgStore {
    async fn list_request_messages(&self, request_id: i32) -> StoreResult<Vec<RequestMessage>> {
        let messages = sqlx::query_as::<_, RequestMessage>(
            "SELECT m.id, m.request_id, m.user_id AS author_id, m.message AS body,
                    m.is_admin_reply, m.created_at,
                    u.full_name AS author_name, u.role AS author_role
             FROM request_messages m
             LEFT JOIN users u ON m.user_id = u.id
             WHERE m.request_id = $1
             ORDER BY m.created_at ASC, m.id ASC",
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn insert_request_message(&self, message: &NewRequestMessage) -> StoreResult<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO request_messages (request_id, user_id, message, is_admin_reply)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(message.request_id)
        .bind(message.author_id)
        .bind(&message.body)
        .bind(message.is_admin_reply)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }
}

#[async_trait]
impl ChatStore for PgStore {
    async fn latest_chat_messages(&self, limit: i64) -> StoreResult<Vec<ChatMessage>> {
        let messages = sqlx::query_as::<_, ChatMessage>(
            "SELECT m.id, m.user_id AS author_id, m.message AS body, m.created_at,
                    u.full_name AS author_name, u.username AS author_username,
                    u.role AS author_role
             FROM chat_messages m
             LEFT JOIN users u ON m.user_id = u.id
             ORDER BY m.created_at DESC, m.id DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn insert_chat_message(&self, author_id: i32, body: &str) -> StoreResult<ChatPosted> {
        let posted = sqlx::query_as::<_, ChatPosted>(
            "INSERT INTO chat_messages (user_id, message)
             VALUES ($1, $2)
             RETURNING id, created_at",
        )
        .bind(author_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;

        Ok(posted)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, full_name, password_hash, role, created_at
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, user_id: i32) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, full_name, password_hash, role, created_at
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert_user(&self, user: &NewUser) -> StoreResult<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO users (username, full_name, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(&user.role)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn delete_user(&self, user_id: i32) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl StatsStore for PgStore {
    async fn request_stats(&self) -> StoreResult<RequestStats> {
        let total_users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let total_requests = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM requests")
            .fetch_one(&self.pool)
            .await?;

        let status_breakdown = self
            .grouped_counts("SELECT status, COUNT(*) FROM requests GROUP BY status")
            .await?;
        let priority_breakdown = self
            .grouped_counts("SELECT priority, COUNT(*) FROM requests GROUP BY priority")
            .await?;

        Ok(RequestStats {
            total_users,
            total_requests,
            pending_requests: status_breakdown
                .get(RequestStatus::PENDING)
                .copied()
                .unwrap_or(0),
            resolved_requests: status_breakdown
                .get(RequestStatus::RESOLVED)
                .copied()
                .unwrap_or(0),
            status_breakdown,
            priority_breakdown,
        })
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
