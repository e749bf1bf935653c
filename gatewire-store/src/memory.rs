/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! In-memory sequence store implementation.
//!
//! This module provides a simple in-memory store suitable for testing
//! and sessions that reset their sequence numbers on every logon.

use crate::traits::{SequenceStore, SessionSeqNums};
use async_trait::async_trait;
use gatewire_core::error::StoreError;
use parking_lot::Mutex;

/// In-memory sequence store.
///
/// Not persistent: counters are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Current counters.
    seqs: Mutex<SessionSeqNums>,
}

impl MemoryStore {
    /// Creates a store with both counters at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with initial counters.
    ///
    /// # Arguments
    /// * `outbound` - Initial outbound sequence number
    /// * `inbound` - Initial inbound sequence number
    #[must_use]
    pub fn with_initial(outbound: u64, inbound: u64) -> Self {
        Self {
            seqs: Mutex::new(SessionSeqNums { outbound, inbound }),
        }
    }
}

#[async_trait]
impl SequenceStore for MemoryStore {
    async fn load(&self) -> Result<SessionSeqNums, StoreError> {
        Ok(*self.seqs.lock())
    }

    async fn save(&self, seqs: SessionSeqNums) -> Result<(), StoreError> {
        *self.seqs.lock() = seqs;
        Ok(())
    }
}
