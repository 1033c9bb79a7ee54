//! Tasklist server: task records over a small JSON API.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:8080 with ./tasks.db
//! cargo run --bin tasklist-server
//!
//! # Custom address and database file
//! cargo run --bin tasklist-server -- --bind 127.0.0.1:3000 --database /tmp/tasks.db
//!
//! # Throwaway in-memory store, API behind a bearer token
//! TASKLIST_AUTH_TOKEN=s3cret cargo run --bin tasklist-server -- --backend memory
//! ```

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use tasklist_server::api::{self, ApiState};
use tasklist_server::auth::AccessGate;
use tasklist_server::config::{ServerCliArgs, ServerConfig, StorageBackend};
use tasklist_server::repository::TaskRepository;
use tasklist_server::store::RecordStore;

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let _log_guard = init_logging(&config.log_level, config.log_file.as_deref());

    let store = match RecordStore::open(&config.storage) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(error = %e, "failed to open task store");
            std::process::exit(1);
        }
    };
    match config.storage.backend {
        StorageBackend::Sqlite => tracing::info!(
            backend = ?config.storage.backend,
            path = %config.storage.path.display(),
            "task store ready"
        ),
        StorageBackend::Memory => {
            tracing::info!(backend = ?config.storage.backend, "task store ready");
        }
    }

    let access = AccessGate::from_token(config.auth_token.clone());
    if access.is_required() {
        tracing::info!("bearer token required for /api/tasks");
    }

    let tasks = TaskRepository::new(store).with_max_title_length(config.max_title_length);
    let state = Arc::new(
        ApiState::new(tasks)
            .with_access(access)
            .with_max_body_size(config.max_body_size),
    );

    match api::start_server(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "task server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "task server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start task server");
            std::process::exit(1);
        }
    }
}

/// Initialize logging to stderr, or to `file_path` when given.
///
/// The returned [`WorkerGuard`] must be held until shutdown so buffered file
/// output is flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let Some(log_path) = file_path else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
        return None;
    };

    let log_dir = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_path.file_name().unwrap_or(log_path.as_os_str());

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}
