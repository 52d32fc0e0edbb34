//! Sitrep server binary, the main entry point for the incident dashboard.
//!
//! Starts an axum HTTP server with structured logging, database
//! initialization, optional bootstrap account creation, and graceful
//! shutdown on SIGTERM/SIGINT.

use sitrep_server::{app, background, config, AppState};
use sitrep_store::RecordStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("SITREP_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Initialize database
    let pool = sitrep_db::create_pool(
        &config.database.path,
        sitrep_db::DbRuntimeSettings {
            busy_timeout_ms: config.database.busy_timeout_ms,
            pool_max_size: config.database.pool_max_size,
        },
    )
    .expect("failed to create database pool");

    {
        let conn = pool
            .get()
            .expect("failed to get database connection for migrations");
        let applied = sitrep_db::run_migrations(&conn).expect("failed to run database migrations");
        if applied > 0 {
            tracing::info!(count = applied, "applied database migrations");
        }

        // Bootstrap operator account on first start, if configured.
        if let (Some(email), Some(password)) = (
            config.auth.bootstrap_email.as_deref(),
            config.auth.bootstrap_password.as_deref(),
        ) {
            let exists = sitrep_auth::any_user_exists(&conn)
                .expect("failed to check for existing operator accounts");
            if exists {
                tracing::debug!("operator accounts exist, skipping bootstrap");
            } else {
                sitrep_auth::create_user(&conn, email, password)
                    .expect("failed to create bootstrap operator account");
                tracing::info!(email, "created bootstrap operator account");
            }
        }
    }

    // Build application
    let state = AppState {
        pool: pool.clone(),
        store: RecordStore::new(pool),
        session_ttl_minutes: config.auth.session_ttl_minutes,
    };

    tokio::spawn(background::start_session_pruning_task(Arc::new(
        state.clone(),
    )));

    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting sitrep server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind listen address");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("sitrep server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
