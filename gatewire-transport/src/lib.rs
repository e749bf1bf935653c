/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! # Gatewire Transport
//!
//! Network transport layer for the Gatewire venue connector.
//!
//! This crate provides:
//! - **Frame codec**: Tokio codec splitting the byte stream into
//!   checksum-verified frames
//! - **Connection**: Endpoint parsing and dialing with connect timeouts
//! - **Reconnect policy**: Exponential backoff with full jitter and a
//!   bounded attempt budget

pub mod connection;
pub mod framing;
pub mod reconnect;

pub use connection::{Endpoint, connect};
pub use framing::{FrameCodec, FramingError};
pub use reconnect::ReconnectPolicy;
