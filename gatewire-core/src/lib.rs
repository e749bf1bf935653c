/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! # Gatewire Core
//!
//! Core types, field model, and error definitions for the Gatewire
//! venue connector.
//!
//! This crate provides:
//! - **Error types**: Unified error hierarchy for all Gatewire operations
//! - **Field model**: Typed field identifiers and values
//! - **Message model**: Kind + ordered field map with domain-checked accessors
//! - **Core types**: Sequence numbers, order identifiers, order attribute enums

pub mod error;
pub mod field;
pub mod message;
pub mod types;

pub use error::{
    ConfigError, ConnectionError, DecodeError, EncodeError, GwError, ProtocolError, Result,
    StoreError, ValidationError,
};
pub use field::{FieldId, FieldValue};
pub use message::{Message, MsgKind};
pub use types::{
    ClientOrderId, ExecType, OrdType, RejectResponseTo, SeqNum, Side, TimeInForce, Timestamp,
};
