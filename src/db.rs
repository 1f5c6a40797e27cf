// src/db.rs
use crate::config::{AppConfig, DataBackend};
use crate::models::auth::{NewUser, ROLE_ADMIN};
use crate::store::{MemoryStore, PgStore, Store, UserStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

pub async fn create_pool(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    let db_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| sqlx::Error::Configuration("DATABASE_URL must be set".into()))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .connect(db_url)
        .await?;

    // Run migrations on startup
    run_migrations(&pool).await?;

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    sqlx::migrate!("./migrations").run(pool).await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// Builds the store selected by `DATA_BACKEND`.
pub async fn connect_store(config: &AppConfig) -> Result<Arc<dyn Store>, sqlx::Error> {
    match config.data_backend {
        DataBackend::Postgres => {
            let pool = create_pool(config).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        DataBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Creates the configured bootstrap admin unless that username already exists.
pub async fn ensure_bootstrap_admin(
    store: &dyn Store,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some((username, password)) = &config.bootstrap_admin else {
        return Ok(());
    };

    if store.find_user_by_username(username).await?.is_some() {
        tracing::debug!(username = %username, "bootstrap admin already exists");
        return Ok(());
    }

    let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
    let id = store
        .insert_user(&NewUser {
            username: username.clone(),
            full_name: username.clone(),
            password_hash,
            role: ROLE_ADMIN.to_string(),
        })
        .await?;

    tracing::info!(user_id = id, username = %username, "bootstrap admin created");
    Ok(())
}
