//! FileDock Server: chunked upload reassembly and file storage.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::{EnvFilter, fmt};

use filedock_core::config::AppConfig;
use filedock_core::error::AppError;
use filedock_core::traits::thumbnail::ThumbnailPipeline;
use filedock_service::{FileRecordBuilder, FileService, UploadService};
use filedock_storage::{
    ChunkMerger, ChunkSink, ImageThumbnailer, OrphanChunkCleanup, SessionRegistry, StoragePaths,
};

#[tokio::main]
async fn main() {
    let env = std::env::var("FILEDOCK_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting FileDock v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Storage layout ───────────────────────────────────
    let paths = StoragePaths::from_config(&config.storage);
    paths.resolve_storage_root().await?;
    paths.resolve_scratch_root().await?;
    tracing::info!(
        storage_root = %config.storage.storage_root.display(),
        chunk_root = %config.storage.chunk_root.display(),
        scratch_root = %config.storage.scratch_root.display(),
        "Storage directories ready"
    );

    // ── Step 2: Metadata store ───────────────────────────────────
    let store = filedock_database::connection::open_store(&config.database).await?;

    // ── Step 3: Upload pipeline ──────────────────────────────────
    let registry = SessionRegistry::new();
    let sink = ChunkSink::new(paths.clone(), registry.clone(), &config.storage);
    let merger = ChunkMerger::new(paths.clone(), registry.clone(), &config.storage);

    let thumbnails: Option<Arc<dyn ThumbnailPipeline>> = if config.thumbnails.enabled {
        tracing::info!(
            max_dimension = config.thumbnails.max_dimension,
            "Thumbnail generation enabled"
        );
        Some(Arc::new(ImageThumbnailer::from_config(&config.thumbnails)))
    } else {
        tracing::info!("Thumbnail generation disabled");
        None
    };

    // ── Step 4: Services ─────────────────────────────────────────
    let builder = FileRecordBuilder::new(
        Arc::clone(&store),
        paths.clone(),
        thumbnails,
        &config.storage,
    );
    let upload_service = Arc::new(UploadService::new(
        sink,
        merger,
        builder,
        paths.clone(),
        &config.storage,
    ));
    let file_service = Arc::new(FileService::new(Arc::clone(&store), paths.clone()));

    // ── Step 5: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 6: Orphan chunk sweeper ─────────────────────────────
    let cleanup = OrphanChunkCleanup::new(
        paths,
        registry,
        Duration::from_secs(config.storage.orphan_ttl_seconds),
    );
    let sweeper_handle = spawn_sweeper(
        cleanup,
        Duration::from_secs(config.storage.sweep_interval_seconds.max(1)),
        shutdown_rx,
    );

    // ── Step 7: Build and start HTTP server ──────────────────────
    let app_state = filedock_api::state::AppState {
        config: Arc::new(config.clone()),
        upload_service,
        file_service,
    };
    let app = filedock_api::router::build_router(app_state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("FileDock server listening on {}", addr);

    // ── Step 8: Graceful shutdown ────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            let _ = shutdown_tx.send(true);
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 9: Wait for background tasks ────────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    if tokio::time::timeout(grace, sweeper_handle).await.is_err() {
        tracing::warn!("Orphan sweeper did not stop within the grace period");
    }

    tracing::info!("FileDock server shut down gracefully");
    Ok(())
}

/// Run the orphan sweeper every `period` until shutdown is signalled.
fn spawn_sweeper(
    cleanup: OrphanChunkCleanup,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match cleanup.sweep().await {
                        Ok(report) => tracing::debug!(?report, "Orphan sweep finished"),
                        Err(e) => tracing::warn!(error = %e, "Orphan sweep failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("Orphan sweeper stopped");
    })
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
