/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! # Gatewire
//!
//! Venue gateway connector toolkit for Rust.
//!
//! Gatewire maintains an authenticated session with a trading venue
//! over TCP, routes order, modify, and cancel requests, and dispatches
//! decoded venue responses to caller-supplied callbacks. Sequence gaps
//! are repaired by replaying the missing range from the venue's
//! recovery endpoint before real-time processing resumes.
//!
//! The workspace is split by concern:
//! - [`gatewire_core`]: types, field/message model, errors
//! - [`gatewire_codec`]: deterministic binary wire codec
//! - [`gatewire_session`]: session state machine, sequencing, heartbeats
//! - [`gatewire_store`]: sequence number persistence
//! - [`gatewire_router`]: order lifecycle tracking and validation
//! - [`gatewire_transport`]: framing, dialing, reconnect backoff
//! - [`gatewire_engine`]: the connector facade
//!
//! ## Example
//!
//! ```no_run
//! use gatewire::engine::{Connector, SessionHandler};
//! use gatewire::session::SessionConfig;
//! use gatewire::core::{GwError, Message};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct Handler;
//!
//! #[async_trait]
//! impl SessionHandler for Handler {
//!     async fn on_error(&self, _error: &GwError) -> bool {
//!         true
//!     }
//!     async fn on_logged_on(&self, seq: u64, _msg: &Message) {
//!         println!("logged on at seq {seq}");
//!     }
//!     async fn on_logged_off(&self, _seq: u64, _msg: &Message) {}
//! }
//!
//! # fn main() -> Result<(), GwError> {
//! let config = SessionConfig::new("LSE", "127.0.0.1:9870", "user", "pass");
//! let connector = Connector::builder()
//!     .with_config(config)
//!     .with_session_handler(Arc::new(Handler))
//!     .build()?;
//! connector.start(false)?;
//! let _ = connector.wait_for_logon(Some(std::time::Duration::from_secs(10)));
//! # Ok(())
//! # }
//! ```

pub use gatewire_codec as codec;
pub use gatewire_core as core;
pub use gatewire_engine as engine;
pub use gatewire_router as router;
pub use gatewire_session as session;
pub use gatewire_store as store;
pub use gatewire_transport as transport;

pub use gatewire_core::{
    ClientOrderId, ExecType, FieldId, FieldValue, GwError, Message, MsgKind, OrdType,
    RejectResponseTo, Result, SeqNum, Side, TimeInForce, Timestamp,
};
pub use gatewire_engine::{Connector, ConnectorBuilder, MessageHandler, SessionHandler};
pub use gatewire_router::{CancelTicket, ModifyTicket, OrderStatus, OrderTicket};
pub use gatewire_session::{SessionConfig, SessionPhase};
