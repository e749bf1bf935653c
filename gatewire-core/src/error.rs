/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! Error types for the Gatewire venue connector.
//!
//! This module provides a unified error hierarchy using `thiserror` for typed,
//! domain-specific errors across all Gatewire operations.

use thiserror::Error;

/// Result type alias using [`GwError`] as the error type.
pub type Result<T> = std::result::Result<T, GwError>;

/// Top-level error type for all Gatewire operations.
#[derive(Debug, Error)]
pub enum GwError {
    /// Error in connector configuration, fatal at startup.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Error in the underlying transport.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Session protocol violation.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Local request validation failure, nothing was transmitted.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Error during message decoding.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Error during message encoding.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Error in sequence store operations.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error from the operating system.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GwError {
    /// Returns true if the error callback may elect to reconnect after this error.
    ///
    /// Configuration and validation errors are never recoverable by
    /// reconnecting; transport failures and malformed or out-of-sequence
    /// traffic are.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Protocol(_) | Self::Decode(_) | Self::Io(_)
        )
    }
}

/// Errors in connector configuration.
///
/// All variants are fatal: the connector refuses to start with an
/// incomplete or unparsable option set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required option is absent from the option set.
    #[error("missing option: {key}")]
    MissingOption {
        /// The option key that was not supplied.
        key: String,
    },

    /// An option value could not be parsed.
    #[error("invalid option {key}: {reason}")]
    InvalidOption {
        /// The option key.
        key: String,
        /// Description of why the value is invalid.
        reason: String,
    },

    /// An endpoint string is not a valid `host:port` pair.
    #[error("invalid endpoint: {value}")]
    InvalidEndpoint {
        /// The offending endpoint string.
        value: String,
    },
}

/// Errors in the transport layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Failed to establish a connection to an endpoint.
    #[error("connect to {endpoint} failed: {reason}")]
    ConnectFailed {
        /// The endpoint that was dialed.
        endpoint: String,
        /// Description of the failure.
        reason: String,
    },

    /// Connection establishment timed out.
    #[error("connect to {endpoint} timed out")]
    ConnectTimeout {
        /// The endpoint that was dialed.
        endpoint: String,
    },

    /// An established connection dropped.
    #[error("connection dropped: {reason}")]
    Dropped {
        /// Description of the drop.
        reason: String,
    },

    /// The connector is not in a state that accepts sends.
    #[error("connector not ready to send")]
    NotReady,

    /// The connector was already started.
    #[error("connector already started")]
    AlreadyStarted,
}

/// Session protocol violations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Received a message that is invalid for the current session phase.
    #[error("unexpected {kind} message in phase {phase}")]
    UnexpectedMessage {
        /// The message kind that arrived.
        kind: String,
        /// The session phase at the time.
        phase: String,
    },

    /// Logon was rejected by the venue.
    #[error("logon rejected: code {code}, {reason}")]
    LogonRejected {
        /// Venue reject code.
        code: u64,
        /// Venue reject reason text.
        reason: String,
    },

    /// The venue logged the session off without a logoff request.
    #[error("unsolicited logout from venue")]
    UnsolicitedLogout,

    /// Logon did not complete within the allowed time.
    #[error("logon timeout after {elapsed_ms} milliseconds")]
    LogonTimeout {
        /// Elapsed time in milliseconds since the logon was sent.
        elapsed_ms: u64,
    },

    /// Inbound sequence number below the expected value.
    #[error("sequence too low: expected {expected}, received {received}")]
    SequenceTooLow {
        /// Expected sequence number.
        expected: u64,
        /// Received sequence number.
        received: u64,
    },

    /// No traffic from the venue for too many heartbeat intervals.
    #[error("missed {missed} heartbeat intervals")]
    MissedHeartbeats {
        /// Consecutive silent intervals.
        missed: u32,
    },

    /// Gap recovery replay could not be completed.
    #[error("replay failed: {reason}")]
    ReplayFailed {
        /// Description of the failure.
        reason: String,
    },
}

/// Local order-request validation failures.
///
/// These are raised before any transport I/O; the venue never sees the
/// rejected request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The referenced client order id is not known to the router.
    #[error("unknown order id: {id}")]
    UnknownOrder {
        /// The referenced client order id.
        id: String,
    },

    /// The client order id is already in use this session.
    #[error("duplicate order id: {id}")]
    DuplicateOrder {
        /// The duplicated client order id.
        id: String,
    },

    /// The referenced order is in a terminal state.
    #[error("order {id} is terminal ({status})")]
    TerminalOrder {
        /// The referenced client order id.
        id: String,
        /// The order's terminal status.
        status: String,
    },

    /// The referenced order has a modify or cancel already in flight.
    #[error("order {id} has a pending request")]
    PendingRequest {
        /// The referenced client order id.
        id: String,
    },

    /// The referenced order has not been acknowledged yet.
    #[error("order {id} not active ({status})")]
    NotActive {
        /// The referenced client order id.
        id: String,
        /// The order's current status.
        status: String,
    },

    /// A required field is absent from the request.
    #[error("missing field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// A status transition is not allowed by the order lifecycle.
    #[error("invalid order transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },
}

/// Errors that occur during message decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Frame buffer is incomplete, need more data.
    #[error("incomplete frame, need more data")]
    Incomplete,

    /// Checksum mismatch between calculated and declared values.
    #[error("checksum mismatch: calculated {calculated}, declared {declared}")]
    ChecksumMismatch {
        /// Calculated checksum value.
        calculated: u8,
        /// Declared checksum value in the frame trailer.
        declared: u8,
    },

    /// Unknown field value type code.
    #[error("unknown field type code: {code}")]
    UnknownTypeCode {
        /// The type code found on the wire.
        code: u8,
    },

    /// Field payload runs past the end of the frame body.
    #[error("field {field} overruns frame body")]
    FieldOverrun {
        /// The field id being decoded.
        field: u16,
    },

    /// Frame body contained bytes after the declared field count.
    #[error("trailing bytes in frame body: {count}")]
    TrailingBytes {
        /// Number of undecoded bytes.
        count: usize,
    },

    /// Missing required field.
    #[error("missing required field: {field}")]
    MissingRequiredField {
        /// The field id of the missing field.
        field: u16,
    },

    /// Invalid field value for the expected domain.
    #[error("invalid value for field {field}: {reason}")]
    InvalidFieldValue {
        /// The field id.
        field: u16,
        /// Description of why the value is invalid.
        reason: String,
    },

    /// Invalid UTF-8 in a string field.
    #[error("invalid utf-8 in field: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Frame exceeds maximum allowed size.
    #[error("frame too large: {size} bytes exceeds maximum {max_size}")]
    FrameTooLarge {
        /// Actual frame size in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        max_size: usize,
    },
}

/// Errors that occur during message encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Encoded frame exceeds maximum allowed size.
    #[error("frame too large: {size} bytes exceeds maximum {max_size}")]
    FrameTooLarge {
        /// Actual frame size in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        max_size: usize,
    },

    /// Field value exceeds the wire format's length limit.
    #[error("value too long for field {field}: {length} exceeds max {max_length}")]
    FieldTooLong {
        /// The field id.
        field: u16,
        /// Actual length of the value.
        length: usize,
        /// Maximum allowed length.
        max_length: usize,
    },

    /// Field value cannot be represented in the wire format.
    #[error("unencodable value for field {field}: {reason}")]
    UnencodableValue {
        /// The field id.
        field: u16,
        /// Description of why the value cannot be encoded.
        reason: String,
    },
}

/// Errors in sequence store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Store contents could not be interpreted.
    #[error("store corrupted: {reason}")]
    Corrupted {
        /// Description of the corruption.
        reason: String,
    },

    /// I/O error in a persistent store.
    #[error("store i/o error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::ChecksumMismatch {
            calculated: 100,
            declared: 200,
        };
        assert_eq!(
            err.to_string(),
            "checksum mismatch: calculated 100, declared 200"
        );
    }

    #[test]
    fn test_gw_error_from_decode() {
        let decode_err = DecodeError::Incomplete;
        let gw_err: GwError = decode_err.into();
        assert!(matches!(gw_err, GwError::Decode(DecodeError::Incomplete)));
    }

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::SequenceTooLow {
            expected: 5,
            received: 3,
        };
        assert_eq!(
            err.to_string(),
            "sequence too low: expected 5, received 3"
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::TerminalOrder {
            id: "o1".to_string(),
            status: "Filled".to_string(),
        };
        assert_eq!(err.to_string(), "order o1 is terminal (Filled)");
    }

    #[test]
    fn test_recoverable_classification() {
        let conn: GwError = ConnectionError::NotReady.into();
        let cfg: GwError = ConfigError::MissingOption {
            key: "username".to_string(),
        }
        .into();
        let val: GwError = ValidationError::UnknownOrder {
            id: "o9".to_string(),
        }
        .into();

        assert!(conn.is_recoverable());
        assert!(!cfg.is_recoverable());
        assert!(!val.is_recoverable());
    }
}
