//! Marathon provider
//!
//! Watches a Marathon registry and publishes routing configurations for the
//! proxy's routing core.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                      MARATHON PROVIDER                        │
//!   │                                                               │
//!   │  ┌──────────┐   ┌───────────┐   ┌────────┐   ┌───────────┐   │
//!   │  │ registry │──▶│ connector │──▶│ filter │──▶│ synthesis │───┼──▶ ConfigMessage
//!   │  │  client  │   │ (events)  │   └────────┘   └───────────┘   │
//!   │  └──────────┘   └───────────┘                                 │
//!   │                                                               │
//!   │  config · lifecycle (worker pool) · resilience · observability │
//!   └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::sync::mpsc;

use marathon_provider::config::{load_config, ProviderConfig};
use marathon_provider::observability::{logging, metrics};
use marathon_provider::registry::{ClientFactory, HttpClientFactory, RegistryClient};
use marathon_provider::resilience::Backoff;
use marathon_provider::{Provider, WorkerPool};

#[derive(Parser)]
#[command(name = "marathon-provider")]
#[command(about = "Marathon service discovery for the routing core", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Block until the registry answers /ping before starting discovery
    #[arg(long)]
    wait_ready: bool,

    /// Print every published configuration to stdout as JSON
    #[arg(long)]
    print: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProviderConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!("marathon-provider v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        endpoints = ?config.registry.endpoints(),
        domain = %config.discovery.domain,
        watch = config.discovery.watch,
        constraints = config.discovery.constraints.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    if cli.wait_ready {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted while waiting for registry");
                return Ok(());
            }
            _ = wait_ready(&config) => {}
        }
    }

    let (tx, mut rx) = mpsc::channel(16);
    let mut pool = WorkerPool::new();
    Provider::new(&config).provide(tx, &mut pool);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down");
                break;
            }
            message = rx.recv() => {
                let Some(message) = message else {
                    tracing::info!("Provider finished");
                    break;
                };
                tracing::info!(
                    provider = %message.provider_name,
                    backends = message.configuration.backends.len(),
                    frontends = message.configuration.frontends.len(),
                    servers = message.configuration.server_count(),
                    "Configuration received"
                );
                if cli.print {
                    println!("{}", serde_json::to_string(&message.configuration)?);
                }
            }
        }
    }

    pool.stop().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Ping the registry until it answers, backing off between attempts.
async fn wait_ready(config: &ProviderConfig) {
    let factory = HttpClientFactory::new(config.registry.clone());
    let mut backoff = Backoff::new(&config.backoff);

    loop {
        let result = match factory.connect() {
            Ok(client) => client.ping().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                tracing::info!("Registry is ready");
                return;
            }
            Err(e) => {
                let delay = backoff.next_delay();
                tracing::warn!(error = %e, delay = ?delay, "Registry not ready");
                tokio::time::sleep(delay).await;
            }
        }
    }
}
