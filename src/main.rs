use colabri_editor::config::Config;
use colabri_editor::db::{DbColab, DocumentStore, MemoryStore};
use colabri_editor::routes::create_app;
use colabri_editor::state::AppState;
use colabri_editor::sync::{BroadcastHub, CollabEngine, FinalFlush};
use std::panic;
use std::sync::Arc;
use tracing::{info, error, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {

    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Load configuration (logged once tracing is up)
    let loaded = Config::load();
    let log_filter = loaded.as_ref().map(Config::log_filter).unwrap_or_else(|_| Config::default().log_filter());

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into()))
        .init();

    info!("Starting server...");

    let config = loaded.unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });
    info!("Configuration loaded (log level {})", config.log_level);

    // Pick the document store
    let store = open_store(&config).await;

    // Start the edit pipeline
    let hub = Arc::new(BroadcastHub::new());
    let engine = Arc::new(CollabEngine::start(store, hub.clone(), config.engine_settings()));
    let app_state = Arc::new(AppState { engine: engine.clone(), hub });

    let app_routes = create_app(app_state);

    // Start the HTTP/WebSocket server
    let listener = tokio::net::TcpListener::bind(config.server_address())
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", config.server_address()));

    info!("🚀 Server running on http://{}", config.server_address());
    info!("📡 WebSocket available at ws://{}/ws", config.server_address());
    info!("📚 Swagger UI available at http://{}/swagger", config.server_address());

    if let Err(e) = axum::serve(listener, app_routes)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
    }

    // Persist whatever is still dirty before exiting
    match engine.shutdown().await {
        Some(report) => match &report.final_flush {
            FinalFlush::Completed(flushed) => info!(
                "Stopped (worker {:?}, backup {:?}, {} documents saved, {} failed)",
                report.worker,
                report.backup,
                flushed.saved(),
                flushed.failed.len()
            ),
            FinalFlush::Unreadable { attempts } => error!(
                "Stopped (worker {:?}, backup {:?}) without a final flush after {} attempts",
                report.worker, report.backup, attempts
            ),
        },
        None => warn!("Edit pipeline was already stopped"),
    }
}

async fn open_store(config: &Config) -> Arc<dyn DocumentStore> {
    if let Some(db_url) = &config.db_url {
        match DbColab::new(db_url).await {
            Ok(db) => match db.migrate().await {
                Ok(()) => {
                    info!("Database initialized successfully");
                    return Arc::new(db);
                }
                Err(e) => error!("Failed to prepare documents table: {}", e),
            },
            Err(e) => error!("Failed to initialize database: {}", e),
        }
        warn!("Falling back to in-memory document store");
    } else {
        warn!("No database URL configured - documents will only be kept in memory");
    }
    Arc::new(MemoryStore::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to listen for SIGTERM: {}", e);
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
    info!("Termination signal received");
}
