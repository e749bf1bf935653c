/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! # Gatewire Codec
//!
//! Deterministic binary wire codec for the Gatewire venue connector.
//!
//! This crate provides:
//! - **Encoder**: Message to frame encoding, deterministic field ordering
//! - **Decoder**: Frame to message decoding with typed failure modes
//! - **Checksum**: One-byte mod-256 body checksum
//!
//! Framing of the byte stream itself lives in `gatewire-transport`; this
//! crate works on complete frames.

pub mod checksum;
pub mod decoder;
pub mod encoder;

pub use checksum::{calculate_checksum, verify_checksum};
pub use decoder::Decoder;
pub use encoder::{
    CHECKSUM_LEN, DEFAULT_MAX_FRAME_SIZE, Encoder, LENGTH_HEADER_LEN,
};
