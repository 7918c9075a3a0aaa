//! Reverse-proxy gateway with a single upstream.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request      ┌──────────┐   ┌───────────────────┐
//!     ───────────────────▶│  http    │──▶│ pipeline stages   │──▶ Upstream
//!                         │  server  │   │ (forwarder, ...)  │◀──
//!                         └──────────┘   └─────────┬─────────┘
//!                                                  │ RequestContext
//!                                                  ▼
//!     Client Response     ┌──────────┐   ┌───────────────────┐
//!     ◀───────────────────│  sink    │◀──│    responder      │
//!                         └──────────┘   │ map / filter      │
//!                                        └───────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use proxy_responder::config::{load_config, GatewayConfig};
use proxy_responder::observability::{logging, metrics};
use proxy_responder::HttpServer;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "proxy-responder", version, about)]
struct Args {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability)?;

    tracing::info!("proxy-responder v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
