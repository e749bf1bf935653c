/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! Sequence store trait definition.
//!
//! This module defines the abstract interface for sequence number
//! persistence. A session writes its counters through after every send
//! and receive so a restarted connector resumes where it left off.

use async_trait::async_trait;
use gatewire_core::error::StoreError;
use serde::{Deserialize, Serialize};

/// Persisted session sequence counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSeqNums {
    /// Next outbound sequence number.
    pub outbound: u64,
    /// Next expected inbound sequence number.
    pub inbound: u64,
}

impl Default for SessionSeqNums {
    fn default() -> Self {
        Self {
            outbound: 1,
            inbound: 1,
        }
    }
}

/// Abstract interface for sequence number persistence.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Loads the persisted counters.
    ///
    /// A fresh store returns the defaults (both counters at 1).
    ///
    /// # Errors
    /// Returns `StoreError` if the counters cannot be read.
    async fn load(&self) -> Result<SessionSeqNums, StoreError>;

    /// Persists the counters.
    ///
    /// # Arguments
    /// * `seqs` - The counters to persist
    ///
    /// # Errors
    /// Returns `StoreError` if the counters cannot be written.
    async fn save(&self, seqs: SessionSeqNums) -> Result<(), StoreError>;

    /// Resets the persisted counters to the defaults.
    ///
    /// # Errors
    /// Returns `StoreError` if the reset fails.
    async fn reset(&self) -> Result<(), StoreError> {
        self.save(SessionSeqNums::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockStore;

    #[async_trait]
    impl SequenceStore for MockStore {
        async fn load(&self) -> Result<SessionSeqNums, StoreError> {
            Ok(SessionSeqNums::default())
        }

        async fn save(&self, _seqs: SessionSeqNums) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_mock_store() {
        let store = MockStore;
        let seqs = store.load().await.unwrap();
        assert_eq!(seqs, SessionSeqNums::default());
        assert!(store.save(seqs).await.is_ok());
        assert!(store.reset().await.is_ok());
    }

    #[test]
    fn test_default_counters() {
        let seqs = SessionSeqNums::default();
        assert_eq!(seqs.outbound, 1);
        assert_eq!(seqs.inbound, 1);
    }
}
