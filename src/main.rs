//! Search gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                    SEARCH GATEWAY                    │
//!                    │                                                      │
//!   Client Request   │  ┌─────────┐    ┌──────────┐    ┌──────────────┐     │
//!   ─────────────────┼─▶│  http   │───▶│  cache   │───▶│   routing    │─────┼──▶ Search engine
//!                    │  │ server  │    │ (TTL KV) │    │ SearchRouter │     │
//!                    │  └─────────┘    └──────────┘    └──────┬───────┘     │
//!                    │                                        │ rollback /  │
//!                    │                                        │ transient   │
//!                    │                                        ▼ error       │
//!                    │                                 ┌──────────────┐     │
//!                    │                                 │   database   │─────┼──▶ Relational
//!                    │                                 │   fallback   │     │    query service
//!                    │                                 └──────────────┘     │
//!                    │                                                      │
//!                    │  ┌────────────────────────────────────────────────┐  │
//!                    │  │ health: FailoverController (background loop)   │  │
//!                    │  │ probe → window → thresholds → RollbackFlag     │  │
//!                    │  └────────────────────────────────────────────────┘  │
//!                    │  ┌──────────┐ ┌───────────────┐ ┌────────────────┐   │
//!                    │  │  config  │ │ observability │ │   lifecycle    │   │
//!                    │  └──────────┘ └───────────────┘ └────────────────┘   │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use search_gateway::config::{load_config, GatewayConfig};
use search_gateway::lifecycle::{shutdown_on_signal, Shutdown};
use search_gateway::observability::{logging, metrics};
use search_gateway::HttpServer;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "search-gateway")]
#[command(about = "Bibliographic search API gateway with automatic search engine failover")]
struct Args {
    /// Path to a TOML configuration file. Built-in defaults when omitted.
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

    logging::init_logging(&config.observability);
    tracing::info!("search-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        search_engine = %config.search_engine.name,
        database = %config.database.name,
        probe_interval_secs = config.failover.probe_interval_secs,
        max_error_rate = config.failover.thresholds.max_error_rate,
        max_avg_latency_ms = config.failover.thresholds.max_avg_latency_ms,
        max_consecutive_failures = config.failover.thresholds.max_consecutive_failures,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
