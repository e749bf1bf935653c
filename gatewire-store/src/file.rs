/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! File-backed sequence store implementation.
//!
//! Counters are written through to a JSON file on every save so a
//! restarted connector resumes its session at the persisted sequence
//! numbers instead of rewinding to 1.

use crate::traits::{SequenceStore, SessionSeqNums};
use async_trait::async_trait;
use gatewire_core::error::StoreError;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// File-backed sequence store.
#[derive(Debug)]
pub struct FileStore {
    /// Backing file path.
    path: PathBuf,
    /// Cached counters, kept in sync with the file.
    seqs: Mutex<SessionSeqNums>,
}

impl FileStore {
    /// Opens a store, loading persisted counters when the file exists.
    ///
    /// # Arguments
    /// * `path` - Backing file path
    ///
    /// # Errors
    /// Returns `StoreError` if the file exists but cannot be read or
    /// parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let seqs = if path.exists() {
            let data =
                std::fs::read_to_string(&path).map_err(|e| StoreError::Io(e.to_string()))?;
            serde_json::from_str(&data).map_err(|e| StoreError::Corrupted {
                reason: e.to_string(),
            })?
        } else {
            SessionSeqNums::default()
        };

        Ok(Self {
            path,
            seqs: Mutex::new(seqs),
        })
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the counters to the backing file.
    fn write_through(&self, seqs: SessionSeqNums) -> Result<(), StoreError> {
        let data = serde_json::to_string(&seqs).map_err(|e| StoreError::Corrupted {
            reason: e.to_string(),
        })?;
        std::fs::write(&self.path, data).map_err(|e| StoreError::Io(e.to_string()))
    }
}

#[async_trait]
impl SequenceStore for FileStore {
    async fn load(&self) -> Result<SessionSeqNums, StoreError> {
        Ok(*self.seqs.lock())
    }

    async fn save(&self, seqs: SessionSeqNums) -> Result<(), StoreError> {
        *self.seqs.lock() = seqs;
        self.write_through(seqs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("gatewire-store-{}-{}", std::process::id(), name));
        path
    }

    #[tokio::test]
    async fn test_file_store_fresh() {
        let path = temp_path("fresh");
        let _ = std::fs::remove_file(&path);

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.load().await.unwrap(), SessionSeqNums::default());
    }

    #[tokio::test]
    async fn test_file_store_persists_across_reopen() {
        let path = temp_path("reopen");
        let _ = std::fs::remove_file(&path);

        let store = FileStore::open(&path).unwrap();
        let seqs = SessionSeqNums {
            outbound: 42,
            inbound: 17,
        };
        store.save(seqs).await.unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.load().await.unwrap(), seqs);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_file_store_corrupted() {
        let path = temp_path("corrupted");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            FileStore::open(&path),
            Err(StoreError::Corrupted { .. })
        ));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_file_store_reset() {
        let path = temp_path("reset");
        let _ = std::fs::remove_file(&path);

        let store = FileStore::open(&path).unwrap();
        store
            .save(SessionSeqNums {
                outbound: 5,
                inbound: 9,
            })
            .await
            .unwrap();
        store.reset().await.unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.load().await.unwrap(), SessionSeqNums::default());

        let _ = std::fs::remove_file(&path);
    }
}
