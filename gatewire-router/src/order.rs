/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! Order state and request tickets.
//!
//! This module provides:
//! - [`OrderStatus`]: Order lifecycle states with a validated transition table
//! - [`Order`]: The router-owned record of one working order
//! - [`OrderTicket`], [`ModifyTicket`], [`CancelTicket`]: Typed request
//!   builders that produce wire messages

use gatewire_core::error::ValidationError;
use gatewire_core::field::FieldId;
use gatewire_core::message::{Message, MsgKind};
use gatewire_core::types::{ClientOrderId, OrdType, Side, TimeInForce};
use rust_decimal::Decimal;
use std::fmt;

/// Order lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// Sent to the venue, not yet acknowledged.
    New,
    /// Acknowledged by the venue, working.
    Acknowledged,
    /// Partially executed, remainder working.
    PartiallyFilled,
    /// Fully executed. Terminal.
    Filled,
    /// Rejected by the venue. Terminal.
    Rejected,
    /// Modify request in flight.
    PendingModify,
    /// Cancel request in flight.
    PendingCancel,
    /// Cancelled. Terminal.
    Cancelled,
    /// Done: expired, IOC remainder, or otherwise finished. Terminal.
    Done,
}

impl OrderStatus {
    /// Returns true if no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Rejected | Self::Cancelled | Self::Done
        )
    }

    /// Returns true if the order may be modified or cancelled.
    ///
    /// Only acknowledged orders without an in-flight request are active.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Acknowledged | Self::PartiallyFilled)
    }

    /// Returns true if `to` is a legal next status.
    ///
    /// # Arguments
    /// * `to` - The candidate next status
    #[must_use]
    pub const fn can_transition(self, to: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match self {
            Self::New => matches!(to, Self::Acknowledged | Self::Rejected | Self::Done),
            Self::Acknowledged => matches!(
                to,
                Self::PartiallyFilled
                    | Self::Filled
                    | Self::Rejected
                    | Self::Done
                    | Self::Cancelled
                    | Self::PendingModify
                    | Self::PendingCancel
            ),
            Self::PartiallyFilled => matches!(
                to,
                Self::PartiallyFilled
                    | Self::Filled
                    | Self::Rejected
                    | Self::Done
                    | Self::Cancelled
                    | Self::PendingModify
                    | Self::PendingCancel
            ),
            Self::PendingModify => matches!(
                to,
                Self::Acknowledged
                    | Self::PartiallyFilled
                    | Self::Filled
                    | Self::Rejected
                    | Self::Done
                    | Self::Cancelled
            ),
            Self::PendingCancel => matches!(
                to,
                Self::Acknowledged
                    | Self::PartiallyFilled
                    | Self::Filled
                    | Self::Rejected
                    | Self::Done
                    | Self::Cancelled
            ),
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Which request is in flight for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    /// A modify request.
    Modify,
    /// A cancel request.
    Cancel,
}

/// An in-flight modify or cancel request.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    /// Request kind.
    pub kind: PendingKind,
    /// The fresh client order id carried by the request.
    pub replacement_id: ClientOrderId,
    /// Status to restore if the venue rejects the request.
    pub prior_status: OrderStatus,
}

/// The router-owned record of one working order.
#[derive(Debug, Clone)]
pub struct Order {
    /// Client order id, unique per session.
    pub clord_id: ClientOrderId,
    /// Instrument identifier.
    pub instrument_id: u64,
    /// Order side.
    pub side: Side,
    /// Order quantity.
    pub qty: u64,
    /// Limit price, absent for market orders.
    pub price: Option<Decimal>,
    /// Order type.
    pub ord_type: OrdType,
    /// Time in force.
    pub time_in_force: TimeInForce,
    /// Trading account.
    pub account: Option<String>,
    /// Venue-assigned order id, set on acknowledgement.
    pub venue_order_id: Option<String>,
    /// Cumulative filled quantity.
    pub filled_qty: u64,
    /// Current lifecycle status.
    status: OrderStatus,
    /// In-flight modify or cancel, if any.
    pending: Option<PendingRequest>,
}

impl Order {
    /// Creates a new order record from a ticket, status New.
    ///
    /// # Arguments
    /// * `ticket` - The order request
    #[must_use]
    pub fn from_ticket(ticket: &OrderTicket) -> Self {
        Self {
            clord_id: ticket.clord_id.clone(),
            instrument_id: ticket.instrument_id,
            side: ticket.side,
            qty: ticket.qty,
            price: ticket.price,
            ord_type: ticket.ord_type,
            time_in_force: ticket.time_in_force,
            account: ticket.account.clone(),
            venue_order_id: None,
            filled_qty: 0,
            status: OrderStatus::New,
            pending: None,
        }
    }

    /// Returns the current status.
    #[inline]
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the in-flight request, if any.
    #[must_use]
    pub const fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    /// Applies a status transition.
    ///
    /// # Arguments
    /// * `to` - The next status
    ///
    /// # Errors
    /// Returns `ValidationError::InvalidTransition` when the lifecycle
    /// table forbids the move; the status is left unchanged.
    pub fn transition(&mut self, to: OrderStatus) -> Result<(), ValidationError> {
        if !self.status.can_transition(to) {
            return Err(ValidationError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }

    /// Records an in-flight request and moves to the pending status.
    pub(crate) fn set_pending(
        &mut self,
        kind: PendingKind,
        replacement_id: ClientOrderId,
    ) -> Result<(), ValidationError> {
        let prior_status = self.status;
        let pending_status = match kind {
            PendingKind::Modify => OrderStatus::PendingModify,
            PendingKind::Cancel => OrderStatus::PendingCancel,
        };
        self.transition(pending_status)?;
        self.pending = Some(PendingRequest {
            kind,
            replacement_id,
            prior_status,
        });
        Ok(())
    }

    /// Clears the in-flight request, returning it.
    pub(crate) fn take_pending(&mut self) -> Option<PendingRequest> {
        self.pending.take()
    }

    /// Keeps the pending request's revert target in step with fills.
    pub(crate) fn note_fill_while_pending(&mut self) {
        if let Some(pending) = self.pending.as_mut() {
            pending.prior_status = OrderStatus::PartiallyFilled;
        }
    }
}

/// Typed request for a new order.
#[derive(Debug, Clone)]
pub struct OrderTicket {
    /// Client order id, unique per session.
    pub clord_id: ClientOrderId,
    /// Instrument identifier.
    pub instrument_id: u64,
    /// Order side.
    pub side: Side,
    /// Order quantity.
    pub qty: u64,
    /// Limit price, absent for market orders.
    pub price: Option<Decimal>,
    /// Order type.
    pub ord_type: OrdType,
    /// Time in force.
    pub time_in_force: TimeInForce,
    /// Trading account.
    pub account: Option<String>,
}

impl OrderTicket {
    /// Creates a ticket with required fields; time in force defaults to Day.
    ///
    /// # Arguments
    /// * `clord_id` - Client order id
    /// * `instrument_id` - Instrument identifier
    /// * `side` - Order side
    /// * `qty` - Order quantity
    /// * `ord_type` - Order type
    #[must_use]
    pub fn new(
        clord_id: ClientOrderId,
        instrument_id: u64,
        side: Side,
        qty: u64,
        ord_type: OrdType,
    ) -> Self {
        Self {
            clord_id,
            instrument_id,
            side,
            qty,
            price: None,
            ord_type,
            time_in_force: TimeInForce::Day,
            account: None,
        }
    }

    /// Sets the limit price.
    #[must_use]
    pub const fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    /// Sets the time in force.
    #[must_use]
    pub const fn with_time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = tif;
        self
    }

    /// Sets the trading account.
    #[must_use]
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Builds the wire message for this request.
    #[must_use]
    pub fn to_message(&self) -> Message {
        let mut msg = Message::new(MsgKind::NewOrder);
        msg.set(FieldId::ClOrdId, self.clord_id.as_str())
            .set(FieldId::InstrumentId, self.instrument_id)
            .set(FieldId::Side, self.side.as_char())
            .set(FieldId::Qty, self.qty)
            .set(FieldId::OrdType, self.ord_type.as_char())
            .set(FieldId::TimeInForce, self.time_in_force.as_char());
        if let Some(price) = self.price {
            msg.set(FieldId::Price, price);
        }
        if let Some(account) = &self.account {
            msg.set(FieldId::Account, account.as_str());
        }
        msg
    }
}

/// Typed request to modify a working order.
#[derive(Debug, Clone)]
pub struct ModifyTicket {
    /// The working order's client order id.
    pub orig_clord_id: ClientOrderId,
    /// Fresh client order id for the replacement.
    pub clord_id: ClientOrderId,
    /// New order quantity.
    pub qty: u64,
    /// New limit price, when changed.
    pub price: Option<Decimal>,
}

impl ModifyTicket {
    /// Creates a modify ticket.
    ///
    /// # Arguments
    /// * `orig_clord_id` - The working order's client order id
    /// * `clord_id` - Fresh client order id for the replacement
    /// * `qty` - New order quantity
    #[must_use]
    pub const fn new(orig_clord_id: ClientOrderId, clord_id: ClientOrderId, qty: u64) -> Self {
        Self {
            orig_clord_id,
            clord_id,
            qty,
            price: None,
        }
    }

    /// Sets the new limit price.
    #[must_use]
    pub const fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    /// Builds the wire message for this request.
    #[must_use]
    pub fn to_message(&self) -> Message {
        let mut msg = Message::new(MsgKind::ModifyOrder);
        msg.set(FieldId::OrigClOrdId, self.orig_clord_id.as_str())
            .set(FieldId::ClOrdId, self.clord_id.as_str())
            .set(FieldId::Qty, self.qty);
        if let Some(price) = self.price {
            msg.set(FieldId::Price, price);
        }
        msg
    }
}

/// Typed request to cancel a working order.
#[derive(Debug, Clone)]
pub struct CancelTicket {
    /// The working order's client order id.
    pub orig_clord_id: ClientOrderId,
    /// Fresh client order id for the cancel request.
    pub clord_id: ClientOrderId,
}

impl CancelTicket {
    /// Creates a cancel ticket.
    ///
    /// # Arguments
    /// * `orig_clord_id` - The working order's client order id
    /// * `clord_id` - Fresh client order id for the cancel request
    #[must_use]
    pub const fn new(orig_clord_id: ClientOrderId, clord_id: ClientOrderId) -> Self {
        Self {
            orig_clord_id,
            clord_id,
        }
    }

    /// Builds the wire message for this request.
    #[must_use]
    pub fn to_message(&self) -> Message {
        let mut msg = Message::new(MsgKind::CancelOrder);
        msg.set(FieldId::OrigClOrdId, self.orig_clord_id.as_str())
            .set(FieldId::ClOrdId, self.clord_id.as_str());
        msg
    }
}
