/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! Binary frame decoder.
//!
//! This module parses complete wire frames into [`Message`] values.
//! Framing (splitting the byte stream into frames) happens in the
//! transport layer; the decoder expects exactly one frame.

use crate::checksum::verify_checksum;
use crate::encoder::{
    CHECKSUM_LEN, DEFAULT_MAX_FRAME_SIZE, LENGTH_HEADER_LEN, TYPE_BOOL, TYPE_CHAR, TYPE_DECIMAL,
    TYPE_INT, TYPE_STR, TYPE_UINT,
};
use gatewire_core::error::DecodeError;
use gatewire_core::field::FieldValue;
use gatewire_core::message::{Message, MsgKind};
use rust_decimal::Decimal;

/// Binary frame decoder.
#[derive(Debug, Clone)]
pub struct Decoder {
    /// Whether to verify the checksum trailer.
    validate_checksum: bool,
    /// Maximum frame size in bytes.
    max_frame_size: usize,
}

impl Decoder {
    /// Creates a new decoder with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            validate_checksum: true,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Sets whether to verify the checksum trailer.
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.validate_checksum = validate;
        self
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub const fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Decodes a complete frame into a message.
    ///
    /// # Arguments
    /// * `frame` - One complete frame, length header through checksum
    ///
    /// # Errors
    /// Returns `DecodeError` if the frame is truncated, oversized, fails
    /// the checksum, or contains malformed fields.
    pub fn decode(&self, frame: &[u8]) -> Result<Message, DecodeError> {
        if frame.len() < LENGTH_HEADER_LEN + 1 + CHECKSUM_LEN {
            return Err(DecodeError::Incomplete);
        }
        if frame.len() > self.max_frame_size {
            return Err(DecodeError::FrameTooLarge {
                size: frame.len(),
                max_size: self.max_frame_size,
            });
        }

        let body_len = usize::from(u16::from_le_bytes([frame[0], frame[1]]));
        let expected_len = LENGTH_HEADER_LEN + body_len + CHECKSUM_LEN;
        if frame.len() < expected_len {
            return Err(DecodeError::Incomplete);
        }
        if frame.len() > expected_len {
            return Err(DecodeError::TrailingBytes {
                count: frame.len() - expected_len,
            });
        }

        let body = &frame[LENGTH_HEADER_LEN..LENGTH_HEADER_LEN + body_len];
        if self.validate_checksum {
            let declared = frame[expected_len - 1];
            verify_checksum(body, declared).map_err(|calculated| {
                DecodeError::ChecksumMismatch {
                    calculated,
                    declared,
                }
            })?;
        }

        let mut cursor = Cursor::new(body);
        let kind = MsgKind::from_wire(cursor.u8(0)?);
        let field_count = cursor.u16(0)?;

        let mut msg = Message::new(kind);
        for _ in 0..field_count {
            let id = cursor.u16(0)?;
            let value = Self::decode_value(id, &mut cursor)?;
            msg.set_raw(id, value);
        }

        if cursor.remaining() != 0 {
            return Err(DecodeError::TrailingBytes {
                count: cursor.remaining(),
            });
        }

        Ok(msg)
    }

    /// Decodes one field value from the cursor.
    fn decode_value(id: u16, cursor: &mut Cursor<'_>) -> Result<FieldValue, DecodeError> {
        let type_code = cursor.u8(id)?;
        match type_code {
            TYPE_UINT => Ok(FieldValue::UInt(cursor.u64(id)?)),
            TYPE_INT => Ok(FieldValue::Int(cursor.u64(id)? as i64)),
            TYPE_DECIMAL => {
                let mantissa = cursor.u64(id)? as i64;
                let scale = cursor.u8(id)?;
                Decimal::try_new(mantissa, u32::from(scale))
                    .map(FieldValue::Decimal)
                    .map_err(|_| DecodeError::InvalidFieldValue {
                        field: id,
                        reason: format!("decimal scale {} out of range", scale),
                    })
            }
            TYPE_STR => {
                let len = usize::from(cursor.u16(id)?);
                let bytes = cursor.take(len, id)?;
                let s = std::str::from_utf8(bytes)?;
                Ok(FieldValue::Str(s.to_string()))
            }
            TYPE_BOOL => match cursor.u8(id)? {
                0 => Ok(FieldValue::Bool(false)),
                1 => Ok(FieldValue::Bool(true)),
                other => Err(DecodeError::InvalidFieldValue {
                    field: id,
                    reason: format!("invalid bool byte {}", other),
                }),
            },
            TYPE_CHAR => {
                let b = cursor.u8(id)?;
                if b.is_ascii() {
                    Ok(FieldValue::Char(b as char))
                } else {
                    Err(DecodeError::InvalidFieldValue {
                        field: id,
                        reason: format!("non-ascii char byte {:#x}", b),
                    })
                }
            }
            code => Err(DecodeError::UnknownTypeCode { code }),
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounds-checked reader over a frame body.
struct Cursor<'a> {
    body: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(body: &'a [u8]) -> Self {
        Self { body, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.body.len() - self.pos
    }

    fn take(&mut self, len: usize, field: u16) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::FieldOverrun { field });
        }
        let slice = &self.body[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u8(&mut self, field: u16) -> Result<u8, DecodeError> {
        Ok(self.take(1, field)?[0])
    }

    fn u16(&mut self, field: u16) -> Result<u16, DecodeError> {
        let b = self.take(2, field)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u64(&mut self, field: u16) -> Result<u64, DecodeError> {
        let b = self.take(8, field)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }
}
