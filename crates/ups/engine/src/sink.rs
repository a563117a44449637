//! Destinations for per-generation state snapshots

use crate::error::PersistError;
use crate::state::StateSnapshot;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Receives one snapshot per completed generation.
#[async_trait]
pub trait StateSink: Send + Sync {
    async fn persist(&self, snapshot: &StateSnapshot) -> Result<(), PersistError>;
}

/// Appends one JSON record per line.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateSink for JsonLinesSink {
    async fn persist(&self, snapshot: &StateSnapshot) -> Result<(), PersistError> {
        let mut line = serde_json::to_vec(snapshot)?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Keeps snapshots in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    snapshots: Mutex<Vec<StateSnapshot>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshots(&self) -> Vec<StateSnapshot> {
        self.snapshots.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.snapshots.lock().await.len()
    }
}

#[async_trait]
impl StateSink for MemorySink {
    async fn persist(&self, snapshot: &StateSnapshot) -> Result<(), PersistError> {
        self.snapshots.lock().await.push(snapshot.clone());
        Ok(())
    }
}
