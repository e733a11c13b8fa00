use model_autoload::{Config, ModelAutoloader, Server};

use std::net::SocketAddr;
use tokio::signal;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from .env file if present
    let dotenv = dotenvy::dotenv();

    let config = Config::from_env()?;
    let _guard = init_logging(&config);

    if let Err(e) = dotenv {
        warn!("No .env file found or error loading it: {}", e);
    }

    let socket_addr = config.socket_addr()?;

    info!("Starting model autoload server on {}", socket_addr);
    info!("Schema folder: {:?}", config.autoload.models_path());

    let mut server = Server::new();
    let autoloader = ModelAutoloader::new(config.autoload.clone());

    // Fatal errors abort startup
    let report = autoloader.register(&mut server).await?;
    debug!("Scanned {} schema file(s)", report.files.len());

    if config.sync_indexes {
        if let Some(db) = server.db() {
            let applied = db.sync_indexes().await?;
            info!("Synced {} index(es)", applied);
        }
    }

    let app = server.router()?;

    let listener = tokio::net::TcpListener::bind(&socket_addr).await?;
    info!("Server listening on {}", socket_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shutdown complete");

    Ok(())
}

/// Console logging, plus a daily-rotated JSON file when `LOG_DIR` is set
fn init_logging(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,model_autoload=debug"));

    let console = fmt::layer().with_target(true).with_thread_ids(true);

    let Some(log_dir) = &config.log_dir else {
        tracing_subscriber::registry().with(filter).with(console).init();
        return None;
    };

    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!("Warning: Could not create log directory {:?}: {}", log_dir, e);
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "model-autoload.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        // File output with JSON format for easy parsing
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .json()
                .with_writer(non_blocking),
        )
        .init();

    debug!("Logging initialized - log directory: {:?}", log_dir);
    Some(guard)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}
