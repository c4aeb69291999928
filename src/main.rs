//! Segment router
//!
//! A tenant-aware front end built with Tokio and Axum. Every request is
//! classified before authentication and forwarded to the backend group that
//! serves the tenant's database segment.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────────────┐
//!                              │                    SEGMENT ROUTER                        │
//!                              │                                                          │
//!     Client Request           │  ┌─────────┐    ┌──────────────┐    ┌──────────────┐     │
//!     ─────────────────────────┼─▶│  http   │───▶│   classify   │───▶│   routing    │     │
//!                              │  │ server  │    │ orchestrator │    │ segment table│     │
//!                              │  └─────────┘    └──────┬───────┘    └──────┬───────┘     │
//!                              │                        │                   │             │
//!                              │                        ▼                   ▼             │
//!                              │                 ┌──────────────┐    ┌──────────────┐     │
//!                              │                 │   services   │    │load_balancer │     │
//!                              │                 │ collaborators│    │   + pool     │     │
//!                              │                 └──────────────┘    └──────┬───────┘     │
//!                              │                                            │             │
//!     Client Response          │  ┌─────────┐    ┌─────────┐               ▼             │
//!     ◀────────────────────────┼──│response │◀───│  http   │◀──────── backend group ◀────┼──── Segment
//!                              │  │  relay  │    │ client  │                             │     Backend
//!                              │  └─────────┘    └─────────┘                             │
//!                              │                                                          │
//!                              │  Cross-cutting: config (hot reload), observability,      │
//!                              │  resilience (collaborator deadlines), lifecycle, admin   │
//!                              └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `segment-router [CONFIG]`. The path falls back to `SEGMENT_ROUTER_CONFIG`;
//! without either the built-in defaults are used and hot reload is off.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use segment_router::classify::{ClassifierRegistry, Orchestrator};
use segment_router::config::{load_config, validate_config, ConfigError, RouterConfig};
use segment_router::config::watcher::watch_config;
use segment_router::http::HttpServer;
use segment_router::lifecycle::{register_classifiers, shutdown_signal, Collaborators, Shutdown};
use segment_router::observability::{logging, metrics};
use segment_router::services::StaticSchemaDirectory;

const CONFIG_ENV: &str = "SEGMENT_ROUTER_CONFIG";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => {
            let config = RouterConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            config
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "segment-router starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backends = config.backends.len(),
        contexts = config.contexts.len(),
        mappings = config.segments.mappings.len(),
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

    let directory = Arc::new(StaticSchemaDirectory::from_config(&config.contexts));
    let registry = Arc::new(ClassifierRegistry::new());
    let collaborators = Collaborators::from_config(directory.clone(), &config.classifiers.remote)?;
    let installed = register_classifiers(&registry, &config.classifiers, &collaborators);
    let orchestrator = Orchestrator::new(registry);

    // The watcher stops when dropped, so it lives until main returns.
    let (_watcher, config_updates) = match &config_path {
        Some(path) => {
            let (watcher, rx) = watch_config(path)?;
            (Some(watcher), rx)
        }
        None => (None, mpsc::unbounded_channel().1),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.trigger();
    });

    let mut server = HttpServer::new(config, orchestrator).with_directory(directory);
    if let Some(basic_auth) = installed.basic_auth {
        server = server.with_protocol_paths(basic_auth);
    }
    server
        .run(listener, config_updates, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
