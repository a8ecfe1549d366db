//! PDF Compress Server
//!
//! Accepts a PDF upload, shrinks it with Ghostscript and sends it back.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdf_compress_server::build_router;
use pdf_compress_server::compressor::GhostscriptCompressor;
use pdf_compress_server::config::Config;
use pdf_compress_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_compress_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting PDF Compress Server v{}", env!("CARGO_PKG_VERSION"));

    let compressor = GhostscriptCompressor::from_config(&config.compressor);
    match compressor.version().await {
        Ok(version) => tracing::info!(
            binary = %compressor.binary().display(),
            version = %version,
            preset = %config.compressor.preset,
            "Using Ghostscript"
        ),
        Err(e) => tracing::warn!(
            binary = %compressor.binary().display(),
            "Ghostscript is not usable ({}); compression requests will fail until GS_BINARY is fixed",
            e
        ),
    }

    let state = AppState::new(config.clone(), Arc::new(compressor))
        .await
        .context("Failed to initialize application state")?;
    tracing::info!("Upload directory: {}", state.store().root().display());

    let app = build_router(state);

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| {
            format!(
                "Failed to bind {}:{}",
                config.server.host, config.server.port
            )
        })?;
    tracing::info!("PDF Compress Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
