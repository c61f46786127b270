//! Ear Training API server
//!
//! Loads credentials, connects to the document store, fetches the bootstrap
//! document and serves the HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ear_training_api::api::{create_router, AppState};
use ear_training_api::auth::{ServiceAccountTokenProvider, StaticToken, TokenSource};
use ear_training_api::bootstrap::fetch_bootstrap_document;
use ear_training_api::config::{Config, StoreBackend};
use ear_training_api::credentials::ServiceAccountKey;
use ear_training_api::error::AppError;
use ear_training_api::store::{DocumentStore, FirestoreStore, MemoryStore};
use ear_training_api::tasks::spawn_cleanup_task;

/// Main entry point for the Ear Training API server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load `.env` and configuration from environment variables
/// 3. Connect the configured document store
/// 4. Fetch and log the bootstrap document
/// 5. Start background cache cleanup task
/// 6. Start HTTP server with graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ear_training_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Ear Training API");

    match dotenvy::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => info!("No .env file found, using process environment"),
        Err(e) => return Err(anyhow::Error::new(e).context("failed to read .env file")),
    }

    let config = Config::from_env();
    config.validate()?;
    info!(
        "Configuration loaded: backend={:?}, port={}, cache_max_entries={}, cache_ttl={}s",
        config.store_backend, config.server_port, config.cache_max_entries, config.cache_ttl
    );

    let backing = connect_store(&config)?;
    let state = AppState::from_config(&config, backing);

    if let Some(path) = &config.bootstrap_document {
        if let Err(e) = fetch_bootstrap_document(state.store.as_ref(), path).await {
            warn!("Bootstrap document {} could not be fetched: {}", path, e);
        }
    }

    let cleanup_handle = spawn_cleanup_task(state.cache.clone(), config.cleanup_interval);
    info!("Background cleanup task started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Builds the backing store selected by `STORE_BACKEND`.
fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    if config.store_backend == StoreBackend::Memory {
        info!("Using in-memory document store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout))
        .build()
        .context("failed to build HTTP client")?;

    let key = config
        .credentials_path
        .as_ref()
        .map(ServiceAccountKey::from_file)
        .transpose()?;

    let project_id = config
        .project_id
        .clone()
        .or_else(|| key.as_ref().map(|k| k.project_id.clone()))
        .ok_or_else(|| AppError::Config("FIRESTORE_PROJECT_ID is not set".into()))?;

    let tokens: Arc<dyn TokenSource> = match (&config.emulator_host, key) {
        (Some(host), _) => {
            info!("Using Firestore emulator at {}", host);
            Arc::new(StaticToken::emulator())
        }
        (None, Some(key)) => {
            info!("Authenticating as {}", key.client_email);
            Arc::new(ServiceAccountTokenProvider::new(
                key,
                client.clone(),
                config.retry_policy(),
            )?)
        }
        (None, None) => {
            return Err(AppError::Credentials("no service account key configured".into()).into())
        }
    };

    info!(
        "Using Firestore project {} database {}",
        project_id, config.database_id
    );
    Ok(Arc::new(FirestoreStore::new(
        client,
        tokens,
        config.retry_policy(),
        &config.firestore_root(),
        &project_id,
        &config.database_id,
    )))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    cleanup_handle.abort();
    warn!("Cleanup task aborted");
}
