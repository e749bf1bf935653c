/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! Connector callback interfaces.
//!
//! Two traits carry everything the connector reports back to the
//! caller: [`SessionHandler`] for session lifecycle events and
//! [`MessageHandler`] for decoded venue messages. Methods the caller
//! does not care about have no-op defaults; the three the session
//! cannot run without are required.

use async_trait::async_trait;
use gatewire_core::error::GwError;
use gatewire_core::message::Message;

/// Session lifecycle callbacks.
#[async_trait]
pub trait SessionHandler: Send + Sync {
    /// Called when the TCP connection to the venue is established.
    async fn on_connected(&self) {}

    /// Called before the logon message is sent.
    ///
    /// The handler may decorate the message with extra fields; the
    /// connector has already populated the credentials.
    ///
    /// # Arguments
    /// * `msg` - The outgoing logon message
    async fn on_logging_on(&self, msg: &mut Message) {
        let _ = msg;
    }

    /// Called when the session fails.
    ///
    /// # Arguments
    /// * `error` - The failure
    ///
    /// # Returns
    /// true to attempt reconnection, false to end the session permanently.
    async fn on_error(&self, error: &GwError) -> bool;

    /// Called when logon completes.
    ///
    /// # Arguments
    /// * `seq` - Inbound sequence number of the logon reply
    /// * `msg` - The decoded logon reply
    async fn on_logged_on(&self, seq: u64, msg: &Message);

    /// Called when logoff completes. The session may be dropped after this.
    ///
    /// # Arguments
    /// * `seq` - Inbound sequence number of the logout, 0 for a local logoff
    /// * `msg` - The decoded logout message
    async fn on_logged_off(&self, seq: u64, msg: &Message);

    /// Called when an inbound sequence gap is detected.
    ///
    /// # Arguments
    /// * `expected` - The sequence number that was expected
    /// * `received` - The sequence number that arrived
    async fn on_gap(&self, expected: u64, received: u64) {
        let _ = (expected, received);
    }
}

/// Decoded message callbacks.
///
/// Each method receives the session sequence number of the inbound
/// message and the decoded message itself. The message is borrowed;
/// handlers clone what they need to keep.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Called for session-level messages.
    async fn on_admin(&self, seq: u64, msg: &Message) {
        let _ = (seq, msg);
    }

    /// Called when an order is accepted.
    async fn on_order_ack(&self, seq: u64, msg: &Message) {
        let _ = (seq, msg);
    }

    /// Called when an order is rejected.
    async fn on_order_rejected(&self, seq: u64, msg: &Message) {
        let _ = (seq, msg);
    }

    /// Called when an order is done: expired, IOC remainder, or cancelled.
    async fn on_order_done(&self, seq: u64, msg: &Message) {
        let _ = (seq, msg);
    }

    /// Called when an order fills, partially or fully.
    async fn on_order_fill(&self, seq: u64, msg: &Message) {
        let _ = (seq, msg);
    }

    /// Called when a modify is accepted.
    async fn on_modify_ack(&self, seq: u64, msg: &Message) {
        let _ = (seq, msg);
    }

    /// Called when a modify is rejected.
    async fn on_modify_rejected(&self, seq: u64, msg: &Message) {
        let _ = (seq, msg);
    }

    /// Called when a cancel is rejected.
    async fn on_cancel_rejected(&self, seq: u64, msg: &Message) {
        let _ = (seq, msg);
    }

    /// Called for any message with no more specific callback.
    async fn on_msg(&self, seq: u64, msg: &Message) {
        let _ = (seq, msg);
    }
}

/// Message handler that ignores everything.
#[derive(Debug, Default)]
pub struct NoOpMessageHandler;

#[async_trait]
impl MessageHandler for NoOpMessageHandler {}

#[cfg(test)]
mod tests {
    use super::*;
    use gatewire_core::message::MsgKind;

    struct CountingHandler {
        acks: std::sync::atomic::AtomicU64,
    }

    #[async_trait]
    impl MessageHandler for CountingHandler {
        async fn on_order_ack(&self, _seq: u64, _msg: &Message) {
            self.acks
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_default_methods_are_noops() {
        let handler = NoOpMessageHandler;
        let msg = Message::new(MsgKind::Heartbeat);
        handler.on_admin(1, &msg).await;
        handler.on_msg(2, &msg).await;
    }

    #[tokio::test]
    async fn test_override_single_method() {
        let handler = CountingHandler {
            acks: std::sync::atomic::AtomicU64::new(0),
        };
        let msg = Message::new(MsgKind::ExecutionReport);

        handler.on_order_ack(1, &msg).await;
        handler.on_order_fill(2, &msg).await;

        assert_eq!(handler.acks.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
