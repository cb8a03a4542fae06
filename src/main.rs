//! Prefix router
//!
//! Forwards requests to HTTPS upstreams chosen by path prefix.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http::server ──▶ routing::PathRouter
//!                                   │
//!                   ┌───── match ───┴─── no match / reserved ─────┐
//!                   ▼                                             ▼
//!            http::forward ──▶ https://<target_domain>...   http::fallback (200, HTML)
//!                   │
//!   Client ◀────────┘  upstream response, verbatim
//!
//!   Cross-cutting: config (TOML + MAPPING_TABLE, hot reload), observability, lifecycle
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use prefix_router::config::{self, watcher::ConfigWatcher};
use prefix_router::http::HttpServer;
use prefix_router::lifecycle::{signals, Shutdown};
use prefix_router::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "prefix-router")]
#[command(about = "Forward requests to upstreams chosen by path prefix", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logging first: loading the mapping table reports problems through tracing.
    let logging = logging::init_logging();
    tracing::info!("prefix-router v{} starting", env!("CARGO_PKG_VERSION"));

    let config = config::load_config(cli.config.as_deref()).map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;
    if let Err(e) = logging.apply(&config.observability) {
        tracing::warn!(error = %e, "Failed to apply configured log level");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.mappings.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    // Keep the watcher alive for the lifetime of the server.
    let (mapping_updates, _watcher) = match cli.config.as_deref() {
        Some(path) if config.reload.watch => {
            let (watcher, updates) = ConfigWatcher::spawn(path, config.mappings.clone())?;
            (updates, Some(watcher))
        }
        _ => (mpsc::unbounded_channel().1, None),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, mapping_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
