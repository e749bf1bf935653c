/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! Tokio codec for wire frame extraction.
//!
//! This module splits the inbound byte stream into complete frames
//! using the length header, verifying the checksum trailer and the
//! maximum frame size before a frame is surfaced.

use bytes::{BufMut, BytesMut};
use gatewire_codec::checksum::verify_checksum;
use gatewire_codec::encoder::{CHECKSUM_LEN, DEFAULT_MAX_FRAME_SIZE, LENGTH_HEADER_LEN};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

/// Errors that can occur during frame extraction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FramingError {
    /// Checksum mismatch.
    #[error("checksum mismatch: calculated {calculated}, declared {declared}")]
    ChecksumMismatch {
        /// Calculated checksum.
        calculated: u8,
        /// Declared checksum in the frame trailer.
        declared: u8,
    },

    /// Frame exceeds maximum size.
    #[error("frame too large: {size} bytes exceeds maximum {max_size}")]
    FrameTooLarge {
        /// Actual frame size.
        size: usize,
        /// Maximum allowed size.
        max_size: usize,
    },

    /// I/O error.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for FramingError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Tokio codec for wire frame extraction.
///
/// Decoded items are complete frames (length header through checksum),
/// ready for `gatewire_codec::Decoder`.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    /// Maximum frame size in bytes.
    max_frame_size: usize,
    /// Whether to verify checksums.
    validate_checksum: bool,
}

impl FrameCodec {
    /// Creates a new codec with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            validate_checksum: true,
        }
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub const fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Sets whether to verify checksums.
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.validate_checksum = validate;
        self
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = FramingError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < LENGTH_HEADER_LEN {
            return Ok(None);
        }

        let body_len = usize::from(u16::from_le_bytes([src[0], src[1]]));
        let total_len = LENGTH_HEADER_LEN + body_len + CHECKSUM_LEN;

        if total_len > self.max_frame_size {
            return Err(FramingError::FrameTooLarge {
                size: total_len,
                max_size: self.max_frame_size,
            });
        }

        if src.len() < total_len {
            src.reserve(total_len - src.len());
            return Ok(None);
        }

        if self.validate_checksum {
            let body = &src[LENGTH_HEADER_LEN..LENGTH_HEADER_LEN + body_len];
            let declared = src[total_len - 1];
            if let Err(calculated) = verify_checksum(body, declared) {
                return Err(FramingError::ChecksumMismatch {
                    calculated,
                    declared,
                });
            }
        }

        Ok(Some(src.split_to(total_len)))
    }
}

impl Encoder<&[u8]> for FrameCodec {
    type Error = FramingError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put_slice(item);
        Ok(())
    }
}

impl Encoder<BytesMut> for FrameCodec {
    type Error = FramingError;

    fn encode(&mut self, item: BytesMut, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put_slice(&item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatewire_codec::Encoder as MessageEncoder;
    use gatewire_core::field::FieldId;
    use gatewire_core::message::{Message, MsgKind};

    fn heartbeat_frame(seq: u64) -> BytesMut {
        let msg = Message::new(MsgKind::Heartbeat).with(FieldId::MsgSeqNum, seq);
        MessageEncoder::new().encode(&msg).unwrap()
    }

    #[test]
    fn test_decode_complete_frame() {
        let mut codec = FrameCodec::new();
        let mut buf = heartbeat_frame(1);

        let frame = codec.decode(&mut buf).unwrap();
        assert!(frame.is_some());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_incomplete_frame() {
        let mut codec = FrameCodec::new();
        let full = heartbeat_frame(1);
        let mut buf = BytesMut::from(&full[..full.len() - 3]);

        let frame = codec.decode(&mut buf).unwrap();
        assert!(frame.is_none());
    }

    #[test]
    fn test_decode_two_frames_back_to_back() {
        let mut codec = FrameCodec::new();
        let mut buf = heartbeat_frame(1);
        buf.extend_from_slice(&heartbeat_frame(2));

        assert!(codec.decode(&mut buf).unwrap().is_some());
        assert!(codec.decode(&mut buf).unwrap().is_some());
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        let mut codec = FrameCodec::new();
        let mut buf = heartbeat_frame(1);
        let last = buf.len() - 1;
        buf[last] = buf[last].wrapping_add(1);

        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(FramingError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_decode_checksum_validation_disabled() {
        let mut codec = FrameCodec::new().with_checksum_validation(false);
        let mut buf = heartbeat_frame(1);
        let last = buf.len() - 1;
        buf[last] = buf[last].wrapping_add(1);

        assert!(codec.decode(&mut buf).unwrap().is_some());
    }

    #[test]
    fn test_decode_frame_too_large() {
        let mut codec = FrameCodec::new().with_max_frame_size(8);
        let mut buf = heartbeat_frame(1);

        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(FramingError::FrameTooLarge { .. })));
    }

    #[test]
    fn test_encode_passthrough() {
        let mut codec = FrameCodec::new();
        let frame = heartbeat_frame(1);
        let mut dst = BytesMut::new();

        codec.encode(&frame[..], &mut dst).unwrap();
        assert_eq!(&dst[..], &frame[..]);
    }
}
