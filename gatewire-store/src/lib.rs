/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! # Gatewire Store
//!
//! Sequence number persistence for the Gatewire venue connector.
//!
//! This crate provides:
//! - **SequenceStore trait**: Abstract persistence interface
//! - **MemoryStore**: Ephemeral store for tests and reset-on-logon sessions
//! - **FileStore**: JSON file store so restarted sessions resume their
//!   sequence numbers

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::{SequenceStore, SessionSeqNums};
