//! Event sink: drains the bus into an append-only JSON-lines log.
//!
//! The sink is the downstream consumer of the change log. It writes one
//! JSON object per line to a file, or to the `shelf::events` tracing target
//! when no file is configured. It exits once every publisher is dropped.

use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio::task::JoinHandle;

use super::{ChangeEvent, EventBus};

/// Where drained events go.
enum Target {
    File { path: PathBuf, file: File },
    Log,
}

impl Target {
    async fn open(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::Log;
        };
        match open_append(&path).await {
            Ok(file) => {
                tracing::info!(path = %path.display(), "Writing change events to file");
                Self::File { path, file }
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to open event log, logging change events instead"
                );
                Self::Log
            }
        }
    }

    async fn write(&mut self, event: &ChangeEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(event_id = %event.event_id, error = %e, "Failed to encode change event");
                return;
            }
        };

        match self {
            Self::File { path, file } => {
                let written = async {
                    file.write_all(line.as_bytes()).await?;
                    file.write_all(b"\n").await?;
                    file.flush().await
                }
                .await;
                if let Err(e) = written {
                    tracing::warn!(
                        path = %path.display(),
                        event_id = %event.event_id,
                        error = %e,
                        "Failed to append change event"
                    );
                }
            }
            Self::Log => {
                tracing::info!(target: "shelf::events", event = %line, "change");
            }
        }
    }
}

async fn open_append(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path).await
}

/// Drain `rx` until the bus closes.
async fn run(mut rx: Receiver<ChangeEvent>, mut target: Target) {
    loop {
        match rx.recv().await {
            Ok(event) => target.write(&event).await,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event sink fell behind, change events dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
    tracing::debug!("Event sink stopped");
}

/// Spawn the sink task for `bus`.
///
/// The subscription is taken before this returns, so every event published
/// afterwards reaches the sink.
///
/// # Arguments
///
/// * `bus` - Bus to drain
/// * `path` - Append-only JSON-lines file; `None` logs events instead
pub fn spawn_event_sink(bus: &EventBus, path: Option<PathBuf>) -> JoinHandle<()> {
    let rx = bus.subscribe();
    tokio::spawn(async move {
        let target = Target::open(path).await;
        run(rx, target).await;
    })
}
