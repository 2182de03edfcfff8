//! Shelf: a goods catalog service with transactional priority reordering.
//!
//! # Usage
//!
//! ```bash
//! shelf --port 8080 --data-dir ./data --log-level info
//! ```
//!
//! Environment variables can also be used:
//! - `SHELF_PORT`: Port to listen on
//! - `SHELF_DATA_DIR`: Data directory for SQLite
//! - `SHELF_EVENT_LOG`: File receiving the change log
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use anyhow::{anyhow, Context};
use shelf::config::Config;
use shelf::observability::tracing::init_tracing;
use shelf::server::run_server;
use std::fs;
use tokio::sync::watch;

/// Print startup banner with version and configuration.
fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    let event_log = config
        .event_log
        .as_ref()
        .map_or_else(|| "(tracing)".to_string(), |path| path.display().to_string());
    eprintln!(
        r#"
   ____  _          _  __
  / ___|| |__   ___| |/ _|
  \___ \| '_ \ / _ \ | |_
   ___) | | | |  __/ |  _|
  |____/|_| |_|\___|_|_|

  Shelf v{} - Goods Catalog

  Configuration:
    Address:    {}:{}
    Data Dir:   {}
    Cache TTL:  {}s
    Event Log:  {}
    Log Level:  {}

  Press Ctrl+C to shutdown gracefully.
"#,
        version,
        config.host,
        config.port,
        config.data_dir.display(),
        config.cache_ttl_secs,
        event_log,
        config.log_level
    );
}

/// Resolve once SIGINT or SIGTERM arrives.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    () = ctrl_c => {
                        tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
                    }
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, initiating shutdown...");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                ctrl_c.await;
                tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
        tracing::info!("Received Ctrl+C, initiating shutdown...");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse configuration from CLI arguments and environment
    let config = Config::parse_args();

    init_tracing(&config.log_level, config.log_format);

    // Ensure data directory exists
    fs::create_dir_all(&config.data_dir).with_context(|| {
        format!("failed to create data directory {}", config.data_dir.display())
    })?;

    print_banner(&config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(true);
    });

    if let Err(e) = run_server(config, shutdown_rx).await {
        tracing::error!(error = %e, "Server failed");
        return Err(anyhow!("server failed: {e}"));
    }

    tracing::info!("Shelf shutdown complete");
    Ok(())
}
