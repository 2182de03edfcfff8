//! Configuration parsing for the Shelf server.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Sensible defaults for quick start

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Log output format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Shelf: a goods catalog service with transactional priority reordering.
#[derive(Parser, Debug, Clone)]
#[command(name = "shelf")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Host address to bind to
    #[arg(long, env = "SHELF_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "SHELF_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Data directory for SQLite database
    #[arg(short, long, env = "SHELF_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "SHELF_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Size of the SQLite connection pool
    #[arg(long, env = "SHELF_POOL_SIZE", default_value_t = 10)]
    pub pool_size: u32,

    /// How long a transaction waits for the database write lock
    #[arg(long, env = "SHELF_BUSY_TIMEOUT_MS", default_value_t = 5000)]
    pub busy_timeout_ms: u64,

    /// Lifetime of a cached list page
    #[arg(long, env = "SHELF_CACHE_TTL_SECS", default_value_t = 60)]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached list pages
    #[arg(long, env = "SHELF_CACHE_CAPACITY", default_value_t = 10_000)]
    pub cache_capacity: u64,

    /// Size of the change event channel
    #[arg(long, env = "SHELF_NOTIFY_CHANNEL_SIZE", default_value_t = 1024)]
    pub notify_channel_size: usize,

    /// Append change events as JSON lines to this file (logged when unset)
    #[arg(long, env = "SHELF_EVENT_LOG")]
    pub event_log: Option<PathBuf>,

    /// Upper bound on the time spent serving one request
    #[arg(long, env = "SHELF_REQUEST_TIMEOUT_MS", default_value_t = 30_000)]
    pub request_timeout_ms: u64,

    /// Serve Prometheus metrics and health checks
    #[arg(long, env = "SHELF_METRICS_ENABLED", default_value_t = false)]
    pub metrics_enabled: bool,

    /// Port for the metrics server
    #[arg(long, env = "SHELF_METRICS_PORT", default_value_t = 9090)]
    pub metrics_port: u16,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Path of the SQLite database file inside the data directory.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("shelf.db")
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Create a configuration for tests rooted at `data_dir`.
    pub fn test_config(data_dir: PathBuf) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0, // Random port
            data_dir,
            log_level: "debug".into(),
            pool_size: 4,
            busy_timeout_ms: 2000,
            notify_channel_size: 256,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            log_level: "info".into(),
            log_format: LogFormat::Text,
            pool_size: 10,
            busy_timeout_ms: 5000,
            cache_ttl_secs: 60,
            cache_capacity: 10_000,
            notify_channel_size: 1024,
            event_log: None,
            request_timeout_ms: 30_000,
            metrics_enabled: false,
            metrics_port: 9090,
        }
    }
}
