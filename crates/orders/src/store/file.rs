//! JSON-file retry queue store.
//!
//! The offline order-creation queue must survive process restarts, so
//! entries are kept in a single JSON file. Every operation is a
//! read-modify-write under an async mutex; a crash between read and
//! write leaves the previous file intact.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use maru_core::RetryQueueEntry;

use super::{RepositoryError, RetryQueueStore};

/// Retry queue persisted as a JSON array in a local file.
pub struct JsonRetryQueueStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonRetryQueueStore {
    /// Create a store backed by `path`. The file is created lazily on the
    /// first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_entries(&self) -> Result<Vec<RetryQueueEntry>, RepositoryError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_entries(&self, entries: &[RetryQueueEntry]) -> Result<(), RepositoryError> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl RetryQueueStore for JsonRetryQueueStore {
    async fn append(&self, entry: RetryQueueEntry) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        entries.push(entry);
        self.write_entries(&entries).await
    }

    async fn load(&self) -> Result<Vec<RetryQueueEntry>, RepositoryError> {
        self.read_entries().await
    }

    async fn update(&self, entry: &RetryQueueEntry) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        if let Some(existing) = entries.iter_mut().find(|e| e.id == entry.id) {
            *existing = entry.clone();
        }
        self.write_entries(&entries).await
    }

    async fn remove(&self, ids: &[Uuid]) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        entries.retain(|e| !ids.contains(&e.id));
        self.write_entries(&entries).await
    }
}
