use helpdesk_backend::config::{AppConfig, DataBackend};
use helpdesk_backend::store::Store;
use helpdesk_backend::{db, handlers, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    init_logging(&config)?;

    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set; using the development secret. Do not run like this in production.");
    }

    let store = match db::connect_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to connect to the data store: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!(backend = store.backend_name(), "Data store ready");

    if let Err(e) = db::ensure_bootstrap_admin(store.as_ref(), &config).await {
        tracing::error!("Failed to create bootstrap admin: {}", e);
    }

    let bind_addr = config.bind_addr.clone();
    let shared_state = Arc::new(AppState::new(store, config));
    let app = handlers::app_router(shared_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,helpdesk_backend=trace,sqlx=info,hyper=info,tower_http=info".to_string()
        } else {
            "info,helpdesk_backend=info,sqlx=warn,hyper=warn,tower_http=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if config.log_json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Helpdesk backend starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build mode: {}",
        if cfg!(debug_assertions) { "development" } else { "production" }
    );
    tracing::info!("Log level: {}", log_level);
    tracing::info!(
        "Configuration - Backend: {}, Status policy: {:?}, Bootstrap admin: {}",
        match config.data_backend {
            DataBackend::Postgres => "postgres",
            DataBackend::Memory => "memory",
        },
        config.status_policy,
        if config.bootstrap_admin.is_some() { "yes" } else { "no" }
    );

    Ok(())
}
