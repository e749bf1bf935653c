/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! Order router.
//!
//! The router owns every working order for the session. Outbound
//! requests are validated here before any transport I/O; inbound
//! execution reports and cancel rejects are matched to their order,
//! the status transition applied, and the dispatch target returned as
//! a [`RouterEvent`] for the connector to map onto callbacks.

use crate::order::{
    CancelTicket, ModifyTicket, Order, OrderStatus, OrderTicket, PendingKind,
};
use gatewire_core::error::ValidationError;
use gatewire_core::field::FieldId;
use gatewire_core::message::Message;
use gatewire_core::types::{ClientOrderId, ExecType, RejectResponseTo};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::warn;

/// Dispatch target for one inbound application message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterEvent {
    /// Order accepted by the venue.
    OrderAck,
    /// Order partially or fully filled.
    OrderFill,
    /// Order done: expired, cancelled, or finished.
    OrderDone,
    /// Order rejected by the venue.
    OrderRejected,
    /// Modify accepted.
    ModifyAck,
    /// Modify rejected.
    ModifyRejected,
    /// Cancel rejected.
    CancelRejected,
    /// Message could not be matched to a working order.
    Unmatched,
}

/// Interior state guarded by the router mutex.
#[derive(Debug, Default)]
struct RouterState {
    /// Working orders keyed by client order id.
    orders: HashMap<ClientOrderId, Order>,
    /// Replacement-id aliases from in-flight modifies and cancels.
    aliases: HashMap<ClientOrderId, ClientOrderId>,
}

impl RouterState {
    /// Resolves an id to the working order's key, following one alias hop.
    fn resolve(&self, id: &ClientOrderId) -> Option<ClientOrderId> {
        if self.orders.contains_key(id) {
            Some(id.clone())
        } else {
            self.aliases.get(id).cloned()
        }
    }

    /// Returns true if the id is taken by an order or an alias.
    fn is_taken(&self, id: &ClientOrderId) -> bool {
        self.orders.contains_key(id) || self.aliases.contains_key(id)
    }
}

/// Tracks working orders and validates requests against their lifecycle.
///
/// Both the caller thread and the I/O task touch the order map, so all
/// state sits behind a single mutex.
#[derive(Debug, Default)]
pub struct OrderRouter {
    /// Guarded order map and aliases.
    state: Mutex<RouterState>,
}

impl OrderRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new order request.
    ///
    /// # Arguments
    /// * `ticket` - The order request
    ///
    /// # Errors
    /// Returns `ValidationError::DuplicateOrder` if the client order id
    /// is already in use this session.
    pub fn register_order(&self, ticket: &OrderTicket) -> Result<(), ValidationError> {
        let mut state = self.state.lock();
        if state.is_taken(&ticket.clord_id) {
            return Err(ValidationError::DuplicateOrder {
                id: ticket.clord_id.to_string(),
            });
        }
        state
            .orders
            .insert(ticket.clord_id.clone(), Order::from_ticket(ticket));
        Ok(())
    }

    /// Registers a modify request against a working order.
    ///
    /// # Arguments
    /// * `ticket` - The modify request
    ///
    /// # Errors
    /// Returns `ValidationError` when the referenced order is unknown,
    /// terminal, not yet acknowledged, already has a request in flight,
    /// or the fresh id is taken.
    pub fn register_modify(&self, ticket: &ModifyTicket) -> Result<(), ValidationError> {
        self.register_pending(
            &ticket.orig_clord_id,
            &ticket.clord_id,
            PendingKind::Modify,
        )
    }

    /// Registers a cancel request against a working order.
    ///
    /// # Arguments
    /// * `ticket` - The cancel request
    ///
    /// # Errors
    /// Same conditions as [`OrderRouter::register_modify`].
    pub fn register_cancel(&self, ticket: &CancelTicket) -> Result<(), ValidationError> {
        self.register_pending(
            &ticket.orig_clord_id,
            &ticket.clord_id,
            PendingKind::Cancel,
        )
    }

    /// Shared validation for modify and cancel registration.
    fn register_pending(
        &self,
        orig: &ClientOrderId,
        replacement: &ClientOrderId,
        kind: PendingKind,
    ) -> Result<(), ValidationError> {
        let mut state = self.state.lock();
        if state.is_taken(replacement) {
            return Err(ValidationError::DuplicateOrder {
                id: replacement.to_string(),
            });
        }

        let order = state
            .orders
            .get_mut(orig)
            .ok_or_else(|| ValidationError::UnknownOrder {
                id: orig.to_string(),
            })?;

        let status = order.status();
        if status.is_terminal() {
            return Err(ValidationError::TerminalOrder {
                id: orig.to_string(),
                status: status.to_string(),
            });
        }
        if order.pending().is_some() {
            return Err(ValidationError::PendingRequest {
                id: orig.to_string(),
            });
        }
        if !status.is_active() {
            return Err(ValidationError::NotActive {
                id: orig.to_string(),
                status: status.to_string(),
            });
        }

        order.set_pending(kind, replacement.clone())?;
        state.aliases.insert(replacement.clone(), orig.clone());
        Ok(())
    }

    /// Applies an execution report, transitioning the matched order.
    ///
    /// # Arguments
    /// * `msg` - The decoded execution report
    ///
    /// # Returns
    /// The dispatch target for the message. Reports that cannot be
    /// matched or would violate the order lifecycle dispatch as
    /// [`RouterEvent::Unmatched`].
    pub fn apply_execution(&self, msg: &Message) -> RouterEvent {
        let Ok(clord) = msg.clord_id() else {
            return RouterEvent::Unmatched;
        };
        let Ok(exec) = msg.exec_type() else {
            return RouterEvent::Unmatched;
        };

        let mut state = self.state.lock();
        let Some(working_id) = state.resolve(&clord) else {
            warn!(id = %clord, exec = %exec, "execution report for unknown order");
            return RouterEvent::Unmatched;
        };

        match exec {
            ExecType::New => self.on_ack(&mut state, &working_id, msg),
            ExecType::PartialFill => self.on_fill(&mut state, &working_id, msg, false),
            ExecType::Fill => self.on_fill(&mut state, &working_id, msg, true),
            ExecType::DoneForDay => self.on_finished(&mut state, &working_id, OrderStatus::Done),
            ExecType::Cancelled => {
                self.on_finished(&mut state, &working_id, OrderStatus::Cancelled)
            }
            ExecType::Replaced => self.on_replaced(&mut state, &working_id),
            ExecType::Rejected => {
                match self.on_finished(&mut state, &working_id, OrderStatus::Rejected) {
                    RouterEvent::OrderDone => RouterEvent::OrderRejected,
                    other => other,
                }
            }
        }
    }

    /// Applies a cancel reject, reverting the pending order.
    ///
    /// # Arguments
    /// * `msg` - The decoded cancel reject
    ///
    /// # Returns
    /// [`RouterEvent::CancelRejected`] or [`RouterEvent::ModifyRejected`]
    /// per the reject's response-to code, or `Unmatched` when it cannot
    /// be tied to a working order.
    pub fn apply_cancel_reject(&self, msg: &Message) -> RouterEvent {
        let Ok(clord) = msg.clord_id() else {
            return RouterEvent::Unmatched;
        };
        let Ok(response_to) = msg.response_to() else {
            return RouterEvent::Unmatched;
        };

        let mut state = self.state.lock();
        let Some(working_id) = state.resolve(&clord) else {
            warn!(id = %clord, "cancel reject for unknown order");
            return RouterEvent::Unmatched;
        };
        let Some(order) = state.orders.get_mut(&working_id) else {
            return RouterEvent::Unmatched;
        };

        let prior = order.take_pending().map(|pending| {
            (pending.replacement_id, pending.prior_status)
        });
        if let Some((replacement_id, prior_status)) = prior {
            if let Err(err) = order.transition(prior_status) {
                warn!(id = %working_id, %err, "failed to revert rejected request");
            }
            state.aliases.remove(&replacement_id);
        }

        match response_to {
            RejectResponseTo::Cancel => RouterEvent::CancelRejected,
            RejectResponseTo::Modify => RouterEvent::ModifyRejected,
        }
    }

    /// Returns the status of a working order, following aliases.
    #[must_use]
    pub fn status(&self, id: &ClientOrderId) -> Option<OrderStatus> {
        let state = self.state.lock();
        let working_id = state.resolve(id)?;
        state.orders.get(&working_id).map(Order::status)
    }

    /// Returns a snapshot of a working order, following aliases.
    #[must_use]
    pub fn order(&self, id: &ClientOrderId) -> Option<Order> {
        let state = self.state.lock();
        let working_id = state.resolve(id)?;
        state.orders.get(&working_id).cloned()
    }

    /// Returns the number of tracked orders, terminal ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().orders.len()
    }

    /// Returns true if no orders are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().orders.is_empty()
    }

    /// Drops all orders and aliases.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.orders.clear();
        state.aliases.clear();
    }

    fn on_ack(
        &self,
        state: &mut RouterState,
        working_id: &ClientOrderId,
        msg: &Message,
    ) -> RouterEvent {
        let Some(order) = state.orders.get_mut(working_id) else {
            return RouterEvent::Unmatched;
        };
        if let Err(err) = order.transition(OrderStatus::Acknowledged) {
            warn!(id = %working_id, %err, "dropping out-of-lifecycle ack");
            return RouterEvent::Unmatched;
        }
        if let Ok(venue_id) = msg.get_str(FieldId::VenueOrderId) {
            order.venue_order_id = Some(venue_id.to_string());
        }
        RouterEvent::OrderAck
    }

    fn on_fill(
        &self,
        state: &mut RouterState,
        working_id: &ClientOrderId,
        msg: &Message,
        full: bool,
    ) -> RouterEvent {
        let Some(order) = state.orders.get_mut(working_id) else {
            return RouterEvent::Unmatched;
        };

        let target = if full {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        if let Err(err) = order.transition(target) {
            warn!(id = %working_id, %err, "dropping out-of-lifecycle fill");
            return RouterEvent::Unmatched;
        }

        if let Ok(last_qty) = msg.get_u64(FieldId::LastQty) {
            order.filled_qty += last_qty;
        }
        if full {
            if let Some(pending) = order.take_pending() {
                state.aliases.remove(&pending.replacement_id);
            }
        } else {
            order.note_fill_while_pending();
        }
        RouterEvent::OrderFill
    }

    fn on_finished(
        &self,
        state: &mut RouterState,
        working_id: &ClientOrderId,
        target: OrderStatus,
    ) -> RouterEvent {
        let Some(order) = state.orders.get_mut(working_id) else {
            return RouterEvent::Unmatched;
        };
        if let Err(err) = order.transition(target) {
            warn!(id = %working_id, %err, "dropping out-of-lifecycle terminal report");
            return RouterEvent::Unmatched;
        }

        if let Some(pending) = order.take_pending() {
            state.aliases.remove(&pending.replacement_id);
        }
        RouterEvent::OrderDone
    }

    fn on_replaced(&self, state: &mut RouterState, working_id: &ClientOrderId) -> RouterEvent {
        let Some(mut order) = state.orders.remove(working_id) else {
            return RouterEvent::Unmatched;
        };

        let Some(pending) = order.take_pending() else {
            // Unsolicited replace; keep the order where it was.
            warn!(id = %working_id, "replace report without pending modify");
            state.orders.insert(working_id.clone(), order);
            return RouterEvent::Unmatched;
        };

        let target = if order.filled_qty > 0 {
            OrderStatus::PartiallyFilled
        } else {
            OrderStatus::Acknowledged
        };
        if let Err(err) = order.transition(target) {
            warn!(id = %working_id, %err, "replace transition failed");
        }

        state.aliases.remove(&pending.replacement_id);
        order.clord_id = pending.replacement_id.clone();
        state.orders.insert(pending.replacement_id, order);
        RouterEvent::ModifyAck
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatewire_core::message::MsgKind;
    use gatewire_core::types::{OrdType, Side};
    use rust_decimal::Decimal;

    fn id(s: &str) -> ClientOrderId {
        ClientOrderId::new(s).unwrap()
    }

    fn ticket(clord: &str) -> OrderTicket {
        OrderTicket::new(id(clord), 133_215, Side::Buy, 1000, OrdType::Limit)
            .with_price(Decimal::new(123_456, 2))
    }

    fn exec(clord: &str, exec_type: ExecType) -> Message {
        Message::new(MsgKind::ExecutionReport)
            .with(FieldId::ClOrdId, clord)
            .with(FieldId::ExecType, exec_type.as_char())
    }

    fn cancel_reject(clord: &str, response_to: RejectResponseTo) -> Message {
        Message::new(MsgKind::CancelReject)
            .with(FieldId::ClOrdId, clord)
            .with(FieldId::ResponseTo, response_to.as_char())
    }

    #[test]
    fn test_register_and_ack() {
        let router = OrderRouter::new();
        router.register_order(&ticket("o1")).unwrap();
        assert_eq!(router.status(&id("o1")), Some(OrderStatus::New));

        let msg = exec("o1", ExecType::New).with(FieldId::VenueOrderId, "V77");
        assert_eq!(router.apply_execution(&msg), RouterEvent::OrderAck);
        assert_eq!(router.status(&id("o1")), Some(OrderStatus::Acknowledged));
        assert_eq!(
            router.order(&id("o1")).unwrap().venue_order_id.as_deref(),
            Some("V77")
        );
    }

    #[test]
    fn test_duplicate_order_rejected() {
        let router = OrderRouter::new();
        router.register_order(&ticket("o1")).unwrap();
        let err = router.register_order(&ticket("o1")).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateOrder { .. }));
    }

    #[test]
    fn test_modify_requires_acknowledged_order() {
        let router = OrderRouter::new();
        router.register_order(&ticket("o1")).unwrap();

        // Still New: not active.
        let err = router
            .register_modify(&ModifyTicket::new(id("o1"), id("o2"), 2000))
            .unwrap_err();
        assert!(matches!(err, ValidationError::NotActive { .. }));

        router.apply_execution(&exec("o1", ExecType::New));
        router
            .register_modify(&ModifyTicket::new(id("o1"), id("o2"), 2000))
            .unwrap();
        assert_eq!(router.status(&id("o1")), Some(OrderStatus::PendingModify));
    }

    #[test]
    fn test_modify_unknown_order() {
        let router = OrderRouter::new();
        let err = router
            .register_modify(&ModifyTicket::new(id("nope"), id("o2"), 1))
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownOrder { .. }));
    }

    #[test]
    fn test_modify_terminal_order_fails_locally() {
        let router = OrderRouter::new();
        router.register_order(&ticket("o1")).unwrap();
        router.apply_execution(&exec("o1", ExecType::New));
        router.apply_execution(&exec("o1", ExecType::Fill));
        assert_eq!(router.status(&id("o1")), Some(OrderStatus::Filled));

        let err = router
            .register_cancel(&CancelTicket::new(id("o1"), id("o2")))
            .unwrap_err();
        assert!(matches!(err, ValidationError::TerminalOrder { .. }));
    }

    #[test]
    fn test_modify_ack_rekeys_order() {
        let router = OrderRouter::new();
        router.register_order(&ticket("o1")).unwrap();
        router.apply_execution(&exec("o1", ExecType::New));
        router
            .register_modify(&ModifyTicket::new(id("o1"), id("o2"), 2000))
            .unwrap();

        // Venue references the replacement id.
        let event = router.apply_execution(&exec("o2", ExecType::Replaced));
        assert_eq!(event, RouterEvent::ModifyAck);
        assert_eq!(router.status(&id("o2")), Some(OrderStatus::Acknowledged));
        assert_eq!(router.status(&id("o1")), None);
    }

    #[test]
    fn test_modify_reject_reverts_order() {
        let router = OrderRouter::new();
        router.register_order(&ticket("o1")).unwrap();
        router.apply_execution(&exec("o1", ExecType::New));
        router
            .register_modify(&ModifyTicket::new(id("o1"), id("o2"), 2000))
            .unwrap();

        let event = router.apply_cancel_reject(&cancel_reject("o2", RejectResponseTo::Modify));
        assert_eq!(event, RouterEvent::ModifyRejected);
        assert_eq!(router.status(&id("o1")), Some(OrderStatus::Acknowledged));
        // Alias released; the id is usable again.
        assert_eq!(router.status(&id("o2")), None);
    }

    #[test]
    fn test_cancel_flow() {
        let router = OrderRouter::new();
        router.register_order(&ticket("o1")).unwrap();
        router.apply_execution(&exec("o1", ExecType::New));
        router
            .register_cancel(&CancelTicket::new(id("o1"), id("o2")))
            .unwrap();
        assert_eq!(router.status(&id("o1")), Some(OrderStatus::PendingCancel));

        let event = router.apply_execution(&exec("o2", ExecType::Cancelled));
        assert_eq!(event, RouterEvent::OrderDone);
        assert_eq!(router.status(&id("o1")), Some(OrderStatus::Cancelled));
    }

    #[test]
    fn test_cancel_reject_reverts_order() {
        let router = OrderRouter::new();
        router.register_order(&ticket("o1")).unwrap();
        router.apply_execution(&exec("o1", ExecType::New));
        router.apply_execution(
            &exec("o1", ExecType::PartialFill).with(FieldId::LastQty, 400u64),
        );
        router
            .register_cancel(&CancelTicket::new(id("o1"), id("o2")))
            .unwrap();

        let event = router.apply_cancel_reject(&cancel_reject("o2", RejectResponseTo::Cancel));
        assert_eq!(event, RouterEvent::CancelRejected);
        assert_eq!(router.status(&id("o1")), Some(OrderStatus::PartiallyFilled));
    }

    #[test]
    fn test_fills_accumulate() {
        let router = OrderRouter::new();
        router.register_order(&ticket("o1")).unwrap();
        router.apply_execution(&exec("o1", ExecType::New));

        router.apply_execution(
            &exec("o1", ExecType::PartialFill).with(FieldId::LastQty, 300u64),
        );
        router.apply_execution(&exec("o1", ExecType::Fill).with(FieldId::LastQty, 700u64));

        let order = router.order(&id("o1")).unwrap();
        assert_eq!(order.filled_qty, 1000);
        assert_eq!(order.status(), OrderStatus::Filled);
    }

    #[test]
    fn test_terminal_order_ignores_further_reports() {
        let router = OrderRouter::new();
        router.register_order(&ticket("o1")).unwrap();
        router.apply_execution(&exec("o1", ExecType::New));
        router.apply_execution(&exec("o1", ExecType::Fill));

        let event = router.apply_execution(&exec("o1", ExecType::Cancelled));
        assert_eq!(event, RouterEvent::Unmatched);
        assert_eq!(router.status(&id("o1")), Some(OrderStatus::Filled));
    }

    #[test]
    fn test_unknown_execution_unmatched() {
        let router = OrderRouter::new();
        assert_eq!(
            router.apply_execution(&exec("ghost", ExecType::New)),
            RouterEvent::Unmatched
        );
    }

    #[test]
    fn test_pending_request_blocks_second_request() {
        let router = OrderRouter::new();
        router.register_order(&ticket("o1")).unwrap();
        router.apply_execution(&exec("o1", ExecType::New));
        router
            .register_cancel(&CancelTicket::new(id("o1"), id("o2")))
            .unwrap();

        let err = router
            .register_modify(&ModifyTicket::new(id("o1"), id("o3"), 1))
            .unwrap_err();
        assert!(matches!(err, ValidationError::PendingRequest { .. }));
    }

    #[test]
    fn test_order_rejected_event() {
        let router = OrderRouter::new();
        router.register_order(&ticket("o1")).unwrap();
        let event = router.apply_execution(&exec("o1", ExecType::Rejected));
        assert_eq!(event, RouterEvent::OrderRejected);
        assert_eq!(router.status(&id("o1")), Some(OrderStatus::Rejected));
    }
}
