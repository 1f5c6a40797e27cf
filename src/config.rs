// src/config.rs
use crate::ledger::StatusPolicy;
use std::env;
use std::str::FromStr;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "dev_secret_change_me";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBackend {
    Postgres,
    Memory,
}

impl FromStr for DataBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(DataBackend::Postgres),
            "memory" => Ok(DataBackend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_backend: DataBackend,
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub status_policy: StatusPolicy,
    pub log_json: bool,
    /// Account created at startup when both values are set and the username is free.
    pub bootstrap_admin: Option<(String, String)>,
}

impl AppConfig {
    /// Loads `.env` (if present) and then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_backend = parse_or(&lookup, "DATA_BACKEND", DataBackend::Postgres)?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        if data_backend == DataBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let status_policy = match lookup("STATUS_POLICY") {
            None => StatusPolicy::Open,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "open" => StatusPolicy::Open,
                "workflow" => StatusPolicy::Workflow,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "STATUS_POLICY",
                        value,
                    })
                }
            },
        };

        Ok(Self {
            data_backend,
            database_url,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            db_acquire_timeout_secs: parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 30)?,
            jwt_secret: lookup("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
            jwt_ttl_hours: parse_or(&lookup, "JWT_TTL_HOURS", 24)?,
            status_policy,
            log_json: lookup("LOG_FORMAT").as_deref() == Some("json"),
            bootstrap_admin: lookup("ADMIN_USERNAME")
                .zip(lookup("ADMIN_PASSWORD"))
                .filter(|(username, password)| !username.is_empty() && !password.is_empty()),
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
