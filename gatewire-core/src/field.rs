/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! Field model for venue messages.
//!
//! This module provides:
//! - [`FieldId`]: Typed enumeration of wire field identifiers
//! - [`FieldValue`]: Enumeration of possible field value types

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive as _;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed field identifiers used on the wire.
///
/// Session-level fields occupy the 1..16 range, order and execution
/// fields the 20+ range. The numeric value is the 16-bit identifier
/// encoded in each field header.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    FromPrimitive, ToPrimitive,
)]
#[repr(u16)]
pub enum FieldId {
    /// Message sequence number within the session.
    MsgSeqNum = 1,
    /// Session username.
    Username = 2,
    /// Session password.
    Password = 3,
    /// Heartbeat interval in seconds.
    HeartbeatIntervalSecs = 4,
    /// Request to reset sequence numbers on logon.
    ResetFlag = 5,
    /// Test request identifier echoed in the heartbeat reply.
    TestReqId = 6,
    /// First sequence number of a replay range.
    BeginSeq = 7,
    /// Last sequence number of a replay range.
    EndSeq = 8,
    /// New inbound sequence number after a sequence reset.
    NewSeq = 9,
    /// Venue reject code (0 means accepted).
    RejectCode = 10,
    /// Venue reject reason text.
    RejectReason = 11,
    /// Time the message was sent.
    SendingTime = 12,

    /// Client order identifier.
    ClOrdId = 20,
    /// Original client order identifier on modify/cancel.
    OrigClOrdId = 21,
    /// Venue-assigned order identifier.
    VenueOrderId = 22,
    /// Instrument identifier.
    InstrumentId = 23,
    /// Order side.
    Side = 24,
    /// Order quantity.
    Qty = 25,
    /// Limit price.
    Price = 26,
    /// Order type.
    OrdType = 27,
    /// Time in force.
    TimeInForce = 28,
    /// Time the request was created.
    TransactTime = 29,
    /// Execution report classification.
    ExecType = 30,
    /// Quantity remaining open.
    LeavesQty = 31,
    /// Quantity of the last fill.
    LastQty = 32,
    /// Price of the last fill.
    LastPrice = 33,
    /// Which request a cancel reject responds to.
    ResponseTo = 34,
    /// Trading account.
    Account = 35,
}

impl FieldId {
    /// Returns the 16-bit wire identifier.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u16 {
        self as u16
    }

    /// Looks up a field id by its wire identifier.
    ///
    /// # Arguments
    /// * `id` - The 16-bit wire identifier
    ///
    /// # Returns
    /// `Some(FieldId)` for known identifiers, `None` otherwise.
    #[must_use]
    pub fn from_wire(id: u16) -> Option<Self> {
        Self::from_u16(id)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.value())
    }
}

impl From<FieldId> for u16 {
    fn from(id: FieldId) -> Self {
        id.value()
    }
}

/// Enumeration of possible field value types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Unsigned integer value.
    UInt(u64),
    /// Signed integer value.
    Int(i64),
    /// Decimal value (prices).
    Decimal(Decimal),
    /// String value.
    Str(String),
    /// Boolean value.
    Bool(bool),
    /// Single character value (enumeration codes).
    Char(char),
}

impl FieldValue {
    /// Returns the value as a u64, if it is a UInt variant.
    #[must_use]
    pub const fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an i64, if it is an Int variant.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a Decimal, if it is a Decimal variant.
    #[must_use]
    pub const fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a string slice, if it is a Str variant.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a bool, if it is a Bool variant.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a char, if it is a Char variant.
    #[must_use]
    pub const fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UInt(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Decimal(v) => write!(f, "{}", v),
            Self::Str(s) => write!(f, "{}", s),
            Self::Bool(v) => write!(f, "{}", if *v { "Y" } else { "N" }),
            Self::Char(c) => write!(f, "{}", c),
        }
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<Decimal> for FieldValue {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<char> for FieldValue {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_id_wire_round_trip() {
        assert_eq!(FieldId::from_wire(1), Some(FieldId::MsgSeqNum));
        assert_eq!(FieldId::from_wire(20), Some(FieldId::ClOrdId));
        assert_eq!(FieldId::from_wire(35), Some(FieldId::Account));
        assert_eq!(FieldId::from_wire(999), None);
        assert_eq!(FieldId::ClOrdId.value(), 20);
    }

    #[test]
    fn test_field_value_accessors() {
        assert_eq!(FieldValue::UInt(42).as_u64(), Some(42));
        assert_eq!(FieldValue::Int(-5).as_i64(), Some(-5));
        assert_eq!(FieldValue::Str("abc".to_string()).as_str(), Some("abc"));
        assert_eq!(FieldValue::Bool(true).as_bool(), Some(true));
        assert_eq!(FieldValue::Char('1').as_char(), Some('1'));
        assert_eq!(FieldValue::UInt(42).as_str(), None);
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::UInt(42).to_string(), "42");
        assert_eq!(FieldValue::Bool(true).to_string(), "Y");
        assert_eq!(FieldValue::Bool(false).to_string(), "N");
        assert_eq!(FieldValue::Char('2').to_string(), "2");
    }

    #[test]
    fn test_field_value_from() {
        assert_eq!(FieldValue::from(7u64), FieldValue::UInt(7));
        assert_eq!(FieldValue::from("x"), FieldValue::Str("x".to_string()));
        assert_eq!(FieldValue::from('c'), FieldValue::Char('c'));
    }
}
