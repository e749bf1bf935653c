//! Order entry walkthrough.
//!
//! Connects to the `venue_sim` example, logs on, submits an order,
//! then modifies and cancels it from the acknowledgement callbacks,
//! mirroring how a trading application drives the connector.

use async_trait::async_trait;
use gatewire::{
    CancelTicket, ClientOrderId, Connector, GwError, Message, MessageHandler, ModifyTicket,
    OrdType, OrderTicket, SessionConfig, SessionHandler, Side,
};
use rust_decimal::Decimal;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{error, info, warn};

const DEFAULT_PORT: u16 = 9870;

fn init_logging() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn id(s: &str) -> ClientOrderId {
    ClientOrderId::new(s).expect("order id fits")
}

/// Drives order -> modify -> cancel from the venue's acknowledgements.
struct Trader {
    connector: OnceLock<Connector>,
    done: Notify,
}

impl Trader {
    fn new() -> Self {
        Self {
            connector: OnceLock::new(),
            done: Notify::new(),
        }
    }

    fn connector(&self) -> &Connector {
        self.connector.get().expect("connector attached")
    }
}

#[async_trait]
impl SessionHandler for Trader {
    async fn on_connected(&self) {
        info!("connected to venue");
    }

    async fn on_error(&self, error: &GwError) -> bool {
        error!(%error, "session error, retrying");
        true
    }

    async fn on_logged_on(&self, seq: u64, _msg: &Message) {
        info!(seq, "logged on");
    }

    async fn on_logged_off(&self, seq: u64, _msg: &Message) {
        info!(seq, "logged off");
        self.done.notify_one();
    }

    async fn on_gap(&self, expected: u64, received: u64) {
        warn!(expected, received, "gap detected");
    }
}

#[async_trait]
impl MessageHandler for Trader {
    async fn on_admin(&self, seq: u64, msg: &Message) {
        info!(seq, %msg, "admin");
    }

    async fn on_order_ack(&self, seq: u64, msg: &Message) {
        info!(seq, %msg, "order acknowledged, sending modify");
        let modify = ModifyTicket::new(id("myorder"), id("myorder1"), 2000)
            .with_price(Decimal::new(123_456, 2));
        if let Err(err) = self.connector().send_modify(&modify) {
            warn!(%err, "failed to send modify");
        }
    }

    async fn on_modify_ack(&self, seq: u64, msg: &Message) {
        info!(seq, %msg, "modify acknowledged, sending cancel");
        let cancel = CancelTicket::new(id("myorder1"), id("myorder2"));
        if let Err(err) = self.connector().send_cancel(&cancel) {
            warn!(%err, "failed to send cancel");
        }
    }

    async fn on_order_done(&self, seq: u64, msg: &Message) {
        info!(seq, %msg, "order done, shutting down");
        if let Err(err) = self.connector().stop() {
            warn!(%err, "failed to stop");
        }
    }

    async fn on_order_rejected(&self, seq: u64, msg: &Message) {
        warn!(seq, %msg, "order rejected");
    }

    async fn on_modify_rejected(&self, seq: u64, msg: &Message) {
        warn!(seq, %msg, "modify rejected");
    }

    async fn on_cancel_rejected(&self, seq: u64, msg: &Message) {
        warn!(seq, %msg, "cancel rejected");
    }

    async fn on_msg(&self, seq: u64, msg: &Message) {
        info!(seq, %msg, "message");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let port = std::env::var("GW_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let trader = Arc::new(Trader::new());
    let config = SessionConfig::new("SIM", format!("127.0.0.1:{port}"), "trader", "secret")
        .with_heartbeat_interval(Duration::from_secs(10));

    let connector = Connector::builder()
        .with_config(config)
        .with_session_handler(trader.clone())
        .with_message_handler(trader.clone())
        .build()?;
    trader
        .connector
        .set(connector.clone())
        .expect("connector attached once");

    connector.start(false)?;
    if !tokio::time::timeout(Duration::from_secs(10), connector.logged_on()).await? {
        anyhow::bail!("logon did not complete");
    }

    let order = OrderTicket::new(id("myorder"), 133_215, Side::Buy, 1000, OrdType::Limit)
        .with_price(Decimal::new(123_456, 2))
        .with_account("DESK1");
    connector.send_order(&order)?;
    info!(clord = %order.clord_id, "order sent, waiting for fills");

    tokio::time::timeout(Duration::from_secs(30), trader.done.notified()).await?;
    info!("done");
    Ok(())
}
