//! deadline-search
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                   DEADLINE SEARCH                     │
//!                  │                                                       │
//!   GET /search    │  ┌─────────┐   ┌────────────────┐   ┌─────────────┐  │
//!   ───────────────┼─▶│  http   │──▶│    context     │──▶│   runner    │──┼──▶ splash API
//!                  │  │ handler │   │ 50ms + userip  │   │ spawn+race  │  │
//!                  │  └────┬────┘   └────────────────┘   └──────┬──────┘  │
//!   response       │       │                                    │         │
//!   ◀──────────────┼───────┴──── Success / Failure / Cancelled ◀┘         │
//!                  │                                                       │
//!                  │  config · observability · lifecycle                  │
//!                  └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use deadline_search::config::{load_config, validate_config, ConfigError, SearchConfig};
use deadline_search::http::HttpServer;
use deadline_search::lifecycle::{signals, Shutdown};
use deadline_search::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "deadline-search")]
#[command(about = "Search front-end that bounds every upstream call by a request deadline", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SearchConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init_logging(&config.observability.log_level);

    tracing::info!("deadline-search v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        deadline_ms = config.timeouts.deadline_ms,
        upstream = %config.upstream.url,
        ip_policy = ?config.client_ip.policy,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            signals::shutdown_signal().await;
            shutdown.trigger();
        }
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
