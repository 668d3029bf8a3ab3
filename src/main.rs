//! Epiphany product-search server.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ net::listener ──▶ http::server ──▶ routing::router
//!                (permits)        (read, time)        │
//!                                                      ├─▶ /health, /metrics, /api/client_info
//!                                                      ├─▶ search::qrs ──▶ search::searcher ──▶ storage
//!                                                      └─▶ static files (http::assets)
//!
//!   observability: tracing logs, MetricsRegistry (/metrics), optional Prometheus exporter
//!   lifecycle:     SIGINT/SIGTERM ──▶ stop accepting ──▶ drain ──▶ exit
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use epiphany::config::{apply_env_overrides, read_config, validate_config, ConfigError, ServerConfig};
use epiphany::lifecycle::{spawn_signal_handler, Shutdown};
use epiphany::net::Listener;
use epiphany::observability::{logging, metrics, MetricsRegistry};
use epiphany::storage::{seed, SqliteStore, Store};
use epiphany::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "epiphany")]
#[command(about = "Minimal product-search HTTP service", long_about = None)]
struct Cli {
    /// Database connection string, e.g. "sqlite:epiphany.db"
    #[arg(value_name = "DATABASE")]
    database: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory static files are served from
    #[arg(long)]
    web_root: Option<String>,

    /// Skip seeding the demo catalog
    #[arg(long)]
    no_seed: bool,
}

impl Cli {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(database) = &self.database {
            config.storage.connection_string = database.clone();
        }
        if let Some(port) = self.port {
            config.listener.set_port(port);
        }
        if let Some(web_root) = &self.web_root {
            config.assets.web_root = web_root.clone();
        }
        if self.no_seed {
            config.storage.seed_items = 0;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    run(cli).await?;
    Ok(())
}

async fn run(cli: Cli) -> epiphany::Result<()> {
    // Defaults < file < environment < CLI
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => ServerConfig::default(),
    };
    apply_env_overrides(&mut config);
    cli.apply(&mut config);

    logging::init_logging(&config.observability);
    tracing::info!("epiphany v{} starting", env!("CARGO_PKG_VERSION"));

    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        database = %config.storage.connection_string,
        web_root = %config.assets.web_root,
        "Configuration loaded"
    );

    let store = SqliteStore::open(&config.storage.connection_string)?;
    store.init_schema()?;
    let store: Arc<dyn Store> = Arc::new(store);

    if config.storage.seed_items > 0 {
        if let Err(e) = seed::seed_catalog(store.as_ref(), config.storage.seed_items) {
            tracing::error!(error = %e, "Failed to seed demo catalog");
        }
    }

    let registry = Arc::new(MetricsRegistry::new());

    if config.observability.prometheus_enabled {
        match config.observability.prometheus_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                prometheus_address = %config.observability.prometheus_address,
                "Failed to parse Prometheus address"
            ),
        }
    }

    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(&config, store, registry);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
