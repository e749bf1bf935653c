/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! # Gatewire Session
//!
//! Session layer for the Gatewire venue connector.
//!
//! This crate provides:
//! - **State machine**: Runtime session FSM with validated transitions and
//!   blocking/async logon waits
//! - **Sequence management**: Atomic sequence number handling with gap
//!   classification
//! - **Heartbeat handling**: Liveness tracking across heartbeat intervals
//! - **Configuration**: Session configuration, programmatic or from a
//!   key-value option set

pub mod config;
pub mod heartbeat;
pub mod sequence;
pub mod state;

pub use config::SessionConfig;
pub use heartbeat::{HeartbeatManager, TickOutcome};
pub use sequence::{SequenceManager, SequenceResult};
pub use state::{InvalidTransition, SessionMonitor, SessionPhase};
