use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vstack_core::manifest::ResourceManifest;
use vstack_core::registry::ResourceRegistry;
use vstack_db::{MemoryStore, PgRecordStore, RecordStore};
use vstack_events::{EventBus, NotificationInbox};

use vstack_api::background::import_worker::{self, ImportQueue};
use vstack_api::config::ServerConfig;
use vstack_api::router::build_app_router;
use vstack_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vstack_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Resources ---
    let registry = Arc::new(load_registry(&config)?);
    ResourceRegistry::install(Arc::clone(&registry))?;

    // --- Store ---
    let store: Arc<dyn RecordStore> = match &config.database_url {
        Some(url) => {
            let pool = vstack_db::create_pool(url)
                .await
                .context("Failed to connect to database")?;
            vstack_db::health_check(&pool)
                .await
                .context("Database health check failed")?;
            tracing::info!("Database connection pool created");
            Arc::new(PgRecordStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    // --- Notifications ---
    let event_bus = Arc::new(EventBus::default());
    let inbox = Arc::new(NotificationInbox::default());
    let cancel = CancellationToken::new();

    let inbox_handle = {
        let inbox = Arc::clone(&inbox);
        let receiver = event_bus.subscribe();
        let cancel = cancel.clone();
        tokio::spawn(async move { inbox.run(receiver, cancel).await })
    };

    // --- Import worker ---
    let (import_queue, import_rx) = ImportQueue::new(config.import_queue_capacity);
    let worker_handle = tokio::spawn(import_worker::run(
        Arc::clone(&store),
        Arc::clone(&event_bus),
        import_rx,
        cancel.clone(),
    ));
    tracing::info!("Background services started (notification inbox, import worker)");

    // --- App state ---
    let state = AppState {
        store,
        registry,
        config: Arc::new(config.clone()),
        inbox,
        import_queue,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let host = config
        .host
        .parse::<IpAddr>()
        .with_context(|| format!("Invalid HOST address {:?}", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    cancel.cancel();
    // The worker finishes the job it is running before it observes the token.
    let _ = tokio::time::timeout(Duration::from_secs(30), worker_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), inbox_handle).await;
    tracing::info!("Graceful shutdown complete");

    Ok(())
}

/// Build the registry from the manifest at `RESOURCES_PATH`, or an empty one.
fn load_registry(config: &ServerConfig) -> anyhow::Result<ResourceRegistry> {
    let Some(path) = &config.resources_path else {
        tracing::warn!("RESOURCES_PATH not set, no resources registered");
        return Ok(ResourceRegistry::builder().build()?);
    };

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read resource manifest {}", path.display()))?;
    let registry = ResourceManifest::from_json(&raw)?.into_registry()?;
    tracing::info!(path = %path.display(), resources = registry.len(), "Resource manifest loaded");
    Ok(registry)
}

/// Wait for SIGINT or SIGTERM (on Unix) to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
