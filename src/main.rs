use anyhow::Context;
use backend::{api, Node};
use clap::Parser;
use pi_chess::core::{Args, NodeConfig};
use std::sync::Arc;
use stockfish_ai::UciEngine;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before parsing, so .env values are visible as environment variables
    let dotenv = dotenvy::dotenv().ok();

    let config = NodeConfig::from_args(Args::parse()).context("Invalid configuration")?;
    init_tracing(config.log_level.as_deref());

    info!("Starting relay chess node...");
    if let Some(path) = dotenv {
        info!("[CONFIG] Loaded environment from {}", path.display());
    }
    config.log_summary();

    let engine = UciEngine::spawn(&config.engine_path, &config.engine)
        .await
        .with_context(|| {
            format!(
                "Failed to initialize chess engine at {}",
                config.engine_path.display()
            )
        })?;
    info!("[ENGINE] Chess engine initialized successfully");

    let node = Arc::new(Node::new(
        config.identity(),
        config.settings(),
        Some(Box::new(engine)),
    )?);

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("[NODE] Listening on {}", listener.local_addr()?);

    // White opens the game in relay mode
    node.start();

    let served = axum::serve(listener, api::router(Arc::clone(&node)))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("[NODE] Shutting down server...");
    node.shutdown().await;
    served.context("HTTP server failed")
}

/// `--log-level` wins over `RUST_LOG`; default is `info`
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|e| {
            eprintln!("Invalid log level {level:?} ({e}), using info");
            EnvFilter::new("info")
        }),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("[NODE] Ctrl-C received"),
        Err(e) => {
            error!("[NODE] Failed to listen for Ctrl-C: {}", e);
            warn!("[NODE] Running until killed");
            std::future::pending::<()>().await;
        }
    }
}
