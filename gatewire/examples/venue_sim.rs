//! Minimal venue simulator.
//!
//! Accepts connector sessions, replies to logons, and acknowledges
//! every order, modify, and cancel. Pair it with the `order_entry`
//! example:
//!
//! ```text
//! cargo run --example venue_sim
//! cargo run --example order_entry
//! ```

use bytes::BytesMut;
use gatewire::codec::{Decoder, Encoder};
use gatewire::transport::FrameCodec;
use gatewire::{FieldId, Message, MsgKind};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Decoder as _;
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 9870;

fn init_logging() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let port = std::env::var("GW_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    info!("venue simulator listening on 127.0.0.1:{port}");

    loop {
        let (stream, peer) = listener.accept().await?;
        info!(%peer, "session connected");
        tokio::spawn(async move {
            if let Err(err) = serve(stream).await {
                warn!(%err, "session ended with error");
            }
        });
    }
}

async fn serve(mut stream: TcpStream) -> anyhow::Result<()> {
    let mut framing = FrameCodec::new();
    let mut buf = BytesMut::with_capacity(8 * 1024);
    let mut out_seq = 1u64;
    let mut next_venue_id = 1u64;

    loop {
        let msg = match read_msg(&mut stream, &mut framing, &mut buf).await? {
            Some(msg) => msg,
            None => {
                info!("session disconnected");
                return Ok(());
            }
        };

        match msg.kind() {
            MsgKind::Logon => {
                info!(user = msg.get_str(FieldId::Username).unwrap_or("?"), "logon");
                let reply = Message::new(MsgKind::LogonReply)
                    .with(FieldId::MsgSeqNum, next_seq(&mut out_seq))
                    .with(FieldId::RejectCode, 0u64);
                send_msg(&mut stream, &reply).await?;
            }
            MsgKind::Heartbeat => {}
            MsgKind::NewOrder => {
                let clord = msg.get_str(FieldId::ClOrdId).unwrap_or("?").to_string();
                info!(clord = %clord, "order accepted");
                let ack = Message::new(MsgKind::ExecutionReport)
                    .with(FieldId::MsgSeqNum, next_seq(&mut out_seq))
                    .with(FieldId::ClOrdId, clord.as_str())
                    .with(FieldId::VenueOrderId, format!("V{}", bump(&mut next_venue_id)))
                    .with(FieldId::ExecType, '0');
                send_msg(&mut stream, &ack).await?;
            }
            MsgKind::ModifyOrder => {
                let clord = msg.get_str(FieldId::ClOrdId).unwrap_or("?").to_string();
                info!(clord = %clord, "modify accepted");
                let ack = Message::new(MsgKind::ExecutionReport)
                    .with(FieldId::MsgSeqNum, next_seq(&mut out_seq))
                    .with(FieldId::ClOrdId, clord.as_str())
                    .with(FieldId::ExecType, '5');
                send_msg(&mut stream, &ack).await?;
            }
            MsgKind::CancelOrder => {
                let clord = msg.get_str(FieldId::ClOrdId).unwrap_or("?").to_string();
                info!(clord = %clord, "cancel accepted");
                let ack = Message::new(MsgKind::ExecutionReport)
                    .with(FieldId::MsgSeqNum, next_seq(&mut out_seq))
                    .with(FieldId::ClOrdId, clord.as_str())
                    .with(FieldId::ExecType, '4');
                send_msg(&mut stream, &ack).await?;
            }
            MsgKind::Logout => {
                info!("logout");
                let reply =
                    Message::new(MsgKind::Logout).with(FieldId::MsgSeqNum, next_seq(&mut out_seq));
                send_msg(&mut stream, &reply).await?;
                return Ok(());
            }
            other => {
                warn!(kind = %other, "ignoring message");
            }
        }
    }
}

async fn read_msg(
    stream: &mut TcpStream,
    framing: &mut FrameCodec,
    buf: &mut BytesMut,
) -> anyhow::Result<Option<Message>> {
    loop {
        if let Some(frame) = framing.decode(buf)? {
            return Ok(Some(Decoder::new().decode(&frame)?));
        }
        if stream.read_buf(buf).await? == 0 {
            return Ok(None);
        }
    }
}

async fn send_msg(stream: &mut TcpStream, msg: &Message) -> anyhow::Result<()> {
    let frame = Encoder::new().encode(msg)?;
    stream.write_all(&frame).await?;
    Ok(())
}

fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}

fn bump(counter: &mut u64) -> u64 {
    let current = *counter;
    *counter += 1;
    current
}
