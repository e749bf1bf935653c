/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! Message model for venue exchanges.
//!
//! This module provides:
//! - [`MsgKind`]: Enumeration of wire message kinds
//! - [`Message`]: A typed field map representing one wire exchange
//!
//! Messages are transient: one is constructed per inbound or outbound
//! event and dropped after dispatch.

use crate::error::DecodeError;
use crate::field::{FieldId, FieldValue};
use crate::types::{ClientOrderId, ExecType, OrdType, RejectResponseTo, Side, TimeInForce};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Wire tag below which message kinds are session-level (admin).
const FIRST_APP_KIND: u8 = 16;

/// Wire message kinds.
///
/// Session-level kinds occupy tags 1..16, application kinds 16 and above.
/// Unknown tags decode as `Custom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MsgKind {
    /// Logon request (1) - Session level.
    Logon,
    /// Logon reply (2) - Session level.
    LogonReply,
    /// Logout (3) - Session level.
    Logout,
    /// Heartbeat (4) - Session level.
    #[default]
    Heartbeat,
    /// Test request (5) - Session level.
    TestRequest,
    /// Session-level reject (6).
    Reject,
    /// Sequence reset (7) - Session level.
    SequenceReset,
    /// Replay request for a missed sequence range (8) - Session level.
    ReplayRequest,
    /// Replay complete marker (9) - Session level.
    ReplayComplete,
    /// New order (16).
    NewOrder,
    /// Modify order (17).
    ModifyOrder,
    /// Cancel order (18).
    CancelOrder,
    /// Execution report (19).
    ExecutionReport,
    /// Cancel/modify reject (20).
    CancelReject,
    /// Business-level reject (21).
    BusinessReject,
    /// Unknown or venue-specific kind.
    Custom(u8),
}

impl MsgKind {
    /// Returns the wire tag for this kind.
    #[must_use]
    pub const fn as_wire(self) -> u8 {
        match self {
            Self::Logon => 1,
            Self::LogonReply => 2,
            Self::Logout => 3,
            Self::Heartbeat => 4,
            Self::TestRequest => 5,
            Self::Reject => 6,
            Self::SequenceReset => 7,
            Self::ReplayRequest => 8,
            Self::ReplayComplete => 9,
            Self::NewOrder => 16,
            Self::ModifyOrder => 17,
            Self::CancelOrder => 18,
            Self::ExecutionReport => 19,
            Self::CancelReject => 20,
            Self::BusinessReject => 21,
            Self::Custom(tag) => tag,
        }
    }

    /// Creates a MsgKind from a wire tag.
    ///
    /// # Arguments
    /// * `tag` - The wire tag byte
    #[must_use]
    pub const fn from_wire(tag: u8) -> Self {
        match tag {
            1 => Self::Logon,
            2 => Self::LogonReply,
            3 => Self::Logout,
            4 => Self::Heartbeat,
            5 => Self::TestRequest,
            6 => Self::Reject,
            7 => Self::SequenceReset,
            8 => Self::ReplayRequest,
            9 => Self::ReplayComplete,
            16 => Self::NewOrder,
            17 => Self::ModifyOrder,
            18 => Self::CancelOrder,
            19 => Self::ExecutionReport,
            20 => Self::CancelReject,
            21 => Self::BusinessReject,
            other => Self::Custom(other),
        }
    }

    /// Returns true if this is a session-level message kind.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        self.as_wire() < FIRST_APP_KIND
    }

    /// Returns true if this is an application message kind.
    #[must_use]
    pub const fn is_app(self) -> bool {
        !self.is_admin()
    }
}

impl fmt::Display for MsgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(tag) => write!(f, "Custom({})", tag),
            other => write!(f, "{:?}", other),
        }
    }
}

/// A typed field map representing one wire exchange.
///
/// Fields are kept ordered by identifier so encoding is deterministic:
/// encoding the same message twice produces identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Message {
    /// The message kind.
    kind: MsgKind,
    /// Fields ordered by wire identifier.
    fields: BTreeMap<u16, FieldValue>,
}

impl Message {
    /// Creates an empty message of the given kind.
    ///
    /// # Arguments
    /// * `kind` - The message kind
    #[must_use]
    pub fn new(kind: MsgKind) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
        }
    }

    /// Returns the message kind.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> MsgKind {
        self.kind
    }

    /// Sets a field value, replacing any existing value.
    ///
    /// # Arguments
    /// * `field` - The field identifier
    /// * `value` - The value to store
    pub fn set(&mut self, field: FieldId, value: impl Into<FieldValue>) -> &mut Self {
        self.fields.insert(field.value(), value.into());
        self
    }

    /// Sets a field by raw wire identifier, replacing any existing value.
    ///
    /// # Arguments
    /// * `id` - The 16-bit wire identifier
    /// * `value` - The value to store
    pub fn set_raw(&mut self, id: u16, value: FieldValue) -> &mut Self {
        self.fields.insert(id, value);
        self
    }

    /// Builder-style variant of [`Message::set`].
    #[must_use]
    pub fn with(mut self, field: FieldId, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    /// Gets a field value.
    #[must_use]
    pub fn get(&self, field: FieldId) -> Option<&FieldValue> {
        self.fields.get(&field.value())
    }

    /// Gets a field value by raw wire identifier.
    #[must_use]
    pub fn get_raw(&self, id: u16) -> Option<&FieldValue> {
        self.fields.get(&id)
    }

    /// Returns true if the field is present.
    #[must_use]
    pub fn contains(&self, field: FieldId) -> bool {
        self.fields.contains_key(&field.value())
    }

    /// Removes a field, returning its value if present.
    pub fn remove(&mut self, field: FieldId) -> Option<FieldValue> {
        self.fields.remove(&field.value())
    }

    /// Returns the number of fields.
    #[inline]
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns an iterator over fields in ascending identifier order.
    pub fn fields(&self) -> impl Iterator<Item = (u16, &FieldValue)> {
        self.fields.iter().map(|(id, v)| (*id, v))
    }

    /// Gets a required field, failing when absent.
    ///
    /// # Errors
    /// Returns `DecodeError::MissingRequiredField` if the field is absent.
    pub fn require(&self, field: FieldId) -> Result<&FieldValue, DecodeError> {
        self.get(field).ok_or(DecodeError::MissingRequiredField {
            field: field.value(),
        })
    }

    /// Gets a required unsigned integer field.
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is absent or not an unsigned integer.
    pub fn get_u64(&self, field: FieldId) -> Result<u64, DecodeError> {
        self.require(field)?
            .as_u64()
            .ok_or_else(|| DecodeError::InvalidFieldValue {
                field: field.value(),
                reason: "expected unsigned integer".to_string(),
            })
    }

    /// Gets a required string field.
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is absent or not a string.
    pub fn get_str(&self, field: FieldId) -> Result<&str, DecodeError> {
        self.require(field)?
            .as_str()
            .ok_or_else(|| DecodeError::InvalidFieldValue {
                field: field.value(),
                reason: "expected string".to_string(),
            })
    }

    /// Gets a required character field.
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is absent or not a character.
    pub fn get_char(&self, field: FieldId) -> Result<char, DecodeError> {
        self.require(field)?
            .as_char()
            .ok_or_else(|| DecodeError::InvalidFieldValue {
                field: field.value(),
                reason: "expected char".to_string(),
            })
    }

    /// Gets a required decimal field.
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is absent or not a decimal.
    pub fn get_decimal(&self, field: FieldId) -> Result<Decimal, DecodeError> {
        self.require(field)?
            .as_decimal()
            .ok_or_else(|| DecodeError::InvalidFieldValue {
                field: field.value(),
                reason: "expected decimal".to_string(),
            })
    }

    /// Gets the session sequence number.
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is absent or zero.
    pub fn seq_num(&self) -> Result<u64, DecodeError> {
        let seq = self.get_u64(FieldId::MsgSeqNum)?;
        if seq == 0 {
            return Err(DecodeError::InvalidFieldValue {
                field: FieldId::MsgSeqNum.value(),
                reason: "sequence number must be >= 1".to_string(),
            });
        }
        Ok(seq)
    }

    /// Gets the order quantity, rejecting zero.
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is absent, not an unsigned
    /// integer, or zero.
    pub fn qty(&self) -> Result<u64, DecodeError> {
        let qty = self.get_u64(FieldId::Qty)?;
        if qty == 0 {
            return Err(DecodeError::InvalidFieldValue {
                field: FieldId::Qty.value(),
                reason: "quantity must be positive".to_string(),
            });
        }
        Ok(qty)
    }

    /// Gets the limit price.
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is absent, not a decimal, or negative.
    pub fn price(&self) -> Result<Decimal, DecodeError> {
        let price = self.get_decimal(FieldId::Price)?;
        if price.is_sign_negative() {
            return Err(DecodeError::InvalidFieldValue {
                field: FieldId::Price.value(),
                reason: "price must not be negative".to_string(),
            });
        }
        Ok(price)
    }

    /// Gets the order side.
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is absent or out of domain.
    pub fn side(&self) -> Result<Side, DecodeError> {
        let c = self.get_char(FieldId::Side)?;
        Side::from_char(c).ok_or_else(|| DecodeError::InvalidFieldValue {
            field: FieldId::Side.value(),
            reason: format!("unknown side code '{}'", c),
        })
    }

    /// Gets the order type.
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is absent or out of domain.
    pub fn ord_type(&self) -> Result<OrdType, DecodeError> {
        let c = self.get_char(FieldId::OrdType)?;
        OrdType::from_char(c).ok_or_else(|| DecodeError::InvalidFieldValue {
            field: FieldId::OrdType.value(),
            reason: format!("unknown order type code '{}'", c),
        })
    }

    /// Gets the time in force.
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is absent or out of domain.
    pub fn time_in_force(&self) -> Result<TimeInForce, DecodeError> {
        let c = self.get_char(FieldId::TimeInForce)?;
        TimeInForce::from_char(c).ok_or_else(|| DecodeError::InvalidFieldValue {
            field: FieldId::TimeInForce.value(),
            reason: format!("unknown time in force code '{}'", c),
        })
    }

    /// Gets the execution report classification.
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is absent or out of domain.
    pub fn exec_type(&self) -> Result<ExecType, DecodeError> {
        let c = self.get_char(FieldId::ExecType)?;
        ExecType::from_char(c).ok_or_else(|| DecodeError::InvalidFieldValue {
            field: FieldId::ExecType.value(),
            reason: format!("unknown exec type code '{}'", c),
        })
    }

    /// Gets the cancel reject response target.
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is absent or out of domain.
    pub fn response_to(&self) -> Result<RejectResponseTo, DecodeError> {
        let c = self.get_char(FieldId::ResponseTo)?;
        RejectResponseTo::from_char(c).ok_or_else(|| DecodeError::InvalidFieldValue {
            field: FieldId::ResponseTo.value(),
            reason: format!("unknown response-to code '{}'", c),
        })
    }

    /// Gets the client order id.
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is absent or over length.
    pub fn clord_id(&self) -> Result<ClientOrderId, DecodeError> {
        let s = self.get_str(FieldId::ClOrdId)?;
        ClientOrderId::new(s).ok_or_else(|| DecodeError::InvalidFieldValue {
            field: FieldId::ClOrdId.value(),
            reason: "client order id too long".to_string(),
        })
    }

    /// Gets the original client order id.
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is absent or over length.
    pub fn orig_clord_id(&self) -> Result<ClientOrderId, DecodeError> {
        let s = self.get_str(FieldId::OrigClOrdId)?;
        ClientOrderId::new(s).ok_or_else(|| DecodeError::InvalidFieldValue {
            field: FieldId::OrigClOrdId.value(),
            reason: "client order id too long".to_string(),
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.kind)?;
        let mut first = true;
        for (id, value) in self.fields() {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            match FieldId::from_wire(id) {
                Some(field) => write!(f, "{:?}={}", field, value)?,
                None => write!(f, "{}={}", id, value)?,
            }
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msg_kind_wire_round_trip() {
        for tag in 1..=32u8 {
            assert_eq!(MsgKind::from_wire(tag).as_wire(), tag);
        }
    }

    #[test]
    fn test_msg_kind_admin_split() {
        assert!(MsgKind::Logon.is_admin());
        assert!(MsgKind::Heartbeat.is_admin());
        assert!(MsgKind::ReplayComplete.is_admin());
        assert!(MsgKind::NewOrder.is_app());
        assert!(MsgKind::ExecutionReport.is_app());
        assert!(MsgKind::Custom(200).is_app());
    }

    #[test]
    fn test_message_set_get() {
        let mut msg = Message::new(MsgKind::NewOrder);
        msg.set(FieldId::ClOrdId, "o1")
            .set(FieldId::Qty, 100u64)
            .set(FieldId::Side, '1');

        assert_eq!(msg.field_count(), 3);
        assert!(msg.contains(FieldId::ClOrdId));
        assert_eq!(msg.get_str(FieldId::ClOrdId).unwrap(), "o1");
        assert_eq!(msg.qty().unwrap(), 100);
        assert_eq!(msg.side().unwrap(), Side::Buy);
    }

    #[test]
    fn test_message_missing_required_field() {
        let msg = Message::new(MsgKind::NewOrder);
        let err = msg.qty().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MissingRequiredField { field } if field == FieldId::Qty.value()
        ));
    }

    #[test]
    fn test_message_zero_qty_rejected() {
        let msg = Message::new(MsgKind::NewOrder).with(FieldId::Qty, 0u64);
        assert!(matches!(
            msg.qty(),
            Err(DecodeError::InvalidFieldValue { .. })
        ));
    }

    #[test]
    fn test_message_negative_price_rejected() {
        let msg =
            Message::new(MsgKind::NewOrder).with(FieldId::Price, Decimal::new(-1050, 2));
        assert!(matches!(
            msg.price(),
            Err(DecodeError::InvalidFieldValue { .. })
        ));
    }

    #[test]
    fn test_message_out_of_domain_side() {
        let msg = Message::new(MsgKind::NewOrder).with(FieldId::Side, 'Z');
        assert!(matches!(
            msg.side(),
            Err(DecodeError::InvalidFieldValue { .. })
        ));
    }

    #[test]
    fn test_message_fields_ordered() {
        let mut msg = Message::new(MsgKind::NewOrder);
        msg.set(FieldId::Qty, 1u64)
            .set(FieldId::MsgSeqNum, 9u64)
            .set(FieldId::ClOrdId, "a");

        let ids: Vec<u16> = msg.fields().map(|(id, _)| id).collect();
        assert_eq!(
            ids,
            vec![
                FieldId::MsgSeqNum.value(),
                FieldId::ClOrdId.value(),
                FieldId::Qty.value()
            ]
        );
    }

    #[test]
    fn test_message_display() {
        let msg = Message::new(MsgKind::Heartbeat).with(FieldId::MsgSeqNum, 3u64);
        assert_eq!(msg.to_string(), "Heartbeat{MsgSeqNum=3}");
    }
}
