/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! Binary frame encoder.
//!
//! This module builds complete wire frames from [`Message`] values. The
//! field map is iterated in ascending identifier order, so encoding is
//! deterministic: the same message always produces identical bytes.

use crate::checksum::calculate_checksum;
use bytes::{BufMut, BytesMut};
use gatewire_core::error::EncodeError;
use gatewire_core::field::FieldValue;
use gatewire_core::message::Message;

/// Size of the frame length header in bytes.
pub const LENGTH_HEADER_LEN: usize = 2;

/// Size of the checksum trailer in bytes.
pub const CHECKSUM_LEN: usize = 1;

/// Default maximum frame size in bytes.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// Wire type code for unsigned integers.
pub const TYPE_UINT: u8 = 1;
/// Wire type code for signed integers.
pub const TYPE_INT: u8 = 2;
/// Wire type code for decimals.
pub const TYPE_DECIMAL: u8 = 3;
/// Wire type code for strings.
pub const TYPE_STR: u8 = 4;
/// Wire type code for booleans.
pub const TYPE_BOOL: u8 = 5;
/// Wire type code for characters.
pub const TYPE_CHAR: u8 = 6;

/// Binary frame encoder.
///
/// Produces frames laid out as a little-endian u16 body length, the body
/// (kind byte, u16 field count, fields sorted by identifier), and a
/// one-byte checksum over the body.
#[derive(Debug, Clone)]
pub struct Encoder {
    /// Maximum frame size in bytes.
    max_frame_size: usize,
}

impl Encoder {
    /// Creates a new encoder with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub const fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Encodes a message into a complete wire frame.
    ///
    /// # Arguments
    /// * `msg` - The message to encode
    ///
    /// # Returns
    /// The complete frame bytes, ready for transmission.
    ///
    /// # Errors
    /// Returns `EncodeError` if a value cannot be represented on the wire
    /// or the frame exceeds the maximum size.
    pub fn encode(&self, msg: &Message) -> Result<BytesMut, EncodeError> {
        let mut body = BytesMut::with_capacity(64);
        body.put_u8(msg.kind().as_wire());
        body.put_u16_le(msg.field_count() as u16);

        for (id, value) in msg.fields() {
            body.put_u16_le(id);
            Self::encode_value(id, value, &mut body)?;
        }

        let body_len = body.len();
        let frame_len = LENGTH_HEADER_LEN + body_len + CHECKSUM_LEN;
        if body_len > usize::from(u16::MAX) || frame_len > self.max_frame_size {
            return Err(EncodeError::FrameTooLarge {
                size: frame_len,
                max_size: self.max_frame_size,
            });
        }

        let mut frame = BytesMut::with_capacity(frame_len);
        frame.put_u16_le(body_len as u16);
        frame.put_slice(&body);
        frame.put_u8(calculate_checksum(&body));
        Ok(frame)
    }

    /// Encodes one field value with its type code.
    fn encode_value(id: u16, value: &FieldValue, body: &mut BytesMut) -> Result<(), EncodeError> {
        match value {
            FieldValue::UInt(v) => {
                body.put_u8(TYPE_UINT);
                body.put_u64_le(*v);
            }
            FieldValue::Int(v) => {
                body.put_u8(TYPE_INT);
                body.put_i64_le(*v);
            }
            FieldValue::Decimal(d) => {
                let mantissa =
                    i64::try_from(d.mantissa()).map_err(|_| EncodeError::UnencodableValue {
                        field: id,
                        reason: "decimal mantissa exceeds 64 bits".to_string(),
                    })?;
                body.put_u8(TYPE_DECIMAL);
                body.put_i64_le(mantissa);
                body.put_u8(d.scale() as u8);
            }
            FieldValue::Str(s) => {
                if s.len() > usize::from(u16::MAX) {
                    return Err(EncodeError::FieldTooLong {
                        field: id,
                        length: s.len(),
                        max_length: usize::from(u16::MAX),
                    });
                }
                body.put_u8(TYPE_STR);
                body.put_u16_le(s.len() as u16);
                body.put_slice(s.as_bytes());
            }
            FieldValue::Bool(b) => {
                body.put_u8(TYPE_BOOL);
                body.put_u8(u8::from(*b));
            }
            FieldValue::Char(c) => {
                if !c.is_ascii() {
                    return Err(EncodeError::UnencodableValue {
                        field: id,
                        reason: format!("char '{}' is not ascii", c),
                    });
                }
                body.put_u8(TYPE_CHAR);
                body.put_u8(*c as u8);
            }
        }
        Ok(())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
