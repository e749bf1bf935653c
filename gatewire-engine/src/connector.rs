/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! Venue connector.
//!
//! [`Connector`] is the public face of Gatewire: it owns the session
//! state machine, the order router, and the transport, and drives them
//! from a single I/O task per live connection. The public API is safe
//! to call from any thread; requests are validated synchronously and
//! handed to the I/O task over a channel.
//!
//! Lifecycle: `start` spawns the session driver, which dials the
//! real-time endpoint, logs on, and then services inbound frames, the
//! outbound queue, and the heartbeat timer. Sequence gaps divert into
//! a recovery sub-flow against the recovery endpoint before real-time
//! processing resumes. Errors consult the session handler's reconnect
//! decision under a bounded backoff budget. `stop` is idempotent and
//! always unblocks `wait_for_logon`.

use crate::builder::ConnectorBuilder;
use crate::callbacks::{MessageHandler, SessionHandler};
use bytes::BytesMut;
use gatewire_codec::decoder::Decoder as WireDecoder;
use gatewire_codec::encoder::Encoder as WireEncoder;
use gatewire_core::error::{ConnectionError, DecodeError, GwError, ProtocolError, Result};
use gatewire_core::field::FieldId;
use gatewire_core::message::{Message, MsgKind};
use gatewire_core::types::{ClientOrderId, Timestamp};
use gatewire_router::order::{CancelTicket, ModifyTicket, OrderStatus, OrderTicket};
use gatewire_router::router::{OrderRouter, RouterEvent};
use gatewire_session::config::SessionConfig;
use gatewire_session::heartbeat::{HeartbeatManager, TickOutcome};
use gatewire_session::sequence::{SequenceManager, SequenceResult};
use gatewire_session::state::{SessionMonitor, SessionPhase};
use gatewire_store::traits::{SequenceStore, SessionSeqNums};
use gatewire_transport::connection::{self, Endpoint};
use gatewire_transport::framing::{FrameCodec, FramingError};
use gatewire_transport::reconnect::ReconnectPolicy;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Notify, mpsc};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::codec::Decoder as _;
use tracing::{debug, error, info, warn};

/// Result of handling one inbound message.
enum Handled {
    /// Keep servicing the connection.
    Continue,
    /// Logoff completed; the session is over.
    LoggedOff,
}

/// Result of one connection's I/O loop.
enum IoOutcome {
    /// Logoff handshake completed.
    LoggedOff,
    /// Shutdown was requested before logoff could complete.
    Shutdown,
}

/// Maps framing failures into the connector error hierarchy.
fn framing_error(err: FramingError) -> GwError {
    match err {
        FramingError::ChecksumMismatch {
            calculated,
            declared,
        } => DecodeError::ChecksumMismatch {
            calculated,
            declared,
        }
        .into(),
        FramingError::FrameTooLarge { size, max_size } => {
            DecodeError::FrameTooLarge { size, max_size }.into()
        }
        FramingError::Io(reason) => ConnectionError::Dropped { reason }.into(),
    }
}

/// Sleeps until an optional deadline; pends forever when absent.
async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Stamps the transaction time when the request did not carry one.
fn stamp_transact_time(msg: &mut Message) {
    if !msg.contains(FieldId::TransactTime) {
        msg.set(FieldId::TransactTime, Timestamp::now().as_nanos());
    }
}

/// Shared connector state, owned behind an `Arc` by the public handle
/// and the session driver task.
struct Core {
    /// Session configuration.
    config: SessionConfig,
    /// Real-time endpoint.
    real_time: Endpoint,
    /// Recovery endpoint, when the venue offers replay.
    recovery: Option<Endpoint>,
    /// Session lifecycle handler.
    session: Arc<dyn SessionHandler>,
    /// Message handler.
    messages: Arc<dyn MessageHandler>,
    /// Sequence persistence.
    store: Arc<dyn SequenceStore>,
    /// Observable session phase.
    monitor: SessionMonitor,
    /// Session sequence counters.
    seqs: SequenceManager,
    /// Working order table.
    router: OrderRouter,
    /// Reconnect backoff budget.
    reconnect: Mutex<ReconnectPolicy>,
    /// Wire encoder.
    encoder: WireEncoder,
    /// Wire decoder.
    decoder: WireDecoder,
    /// Outbound queue sender, used by the public API.
    outbound_tx: mpsc::UnboundedSender<Message>,
    /// Outbound queue receiver, taken by the session driver.
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<Message>>>,
    /// Wakes the driver on shutdown.
    shutdown: Notify,
    /// Set once by `stop`.
    stop_requested: AtomicBool,
    /// Set by `start(reset = true)` or configuration.
    reset_requested: AtomicBool,
    /// Guards against double start.
    started: AtomicBool,
}

impl Core {
    /// Returns true once `stop` has been called.
    fn stopping(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    /// Applies a phase transition, logging a refused move.
    fn set_phase(&self, to: SessionPhase) {
        if let Err(err) = self.monitor.transition(to) {
            warn!(%err, "phase transition refused");
        }
    }

    /// Rejects sends unless the session is logged on.
    fn ensure_ready(&self) -> Result<()> {
        if self.stopping() || !self.monitor.phase().is_ready() {
            return Err(ConnectionError::NotReady.into());
        }
        Ok(())
    }

    /// Hands a message to the I/O task.
    fn enqueue(&self, msg: Message) -> Result<()> {
        self.outbound_tx
            .send(msg)
            .map_err(|_| ConnectionError::NotReady.into())
    }

    /// Writes the sequence counters through to the store.
    async fn persist_seqs(&self) {
        let (outbound, inbound) = self.seqs.snapshot();
        if let Err(err) = self.store.save(SessionSeqNums { outbound, inbound }).await {
            warn!(%err, "failed to persist sequence numbers");
        }
    }

    /// Builds the logon message with credentials and session options.
    fn build_logon(&self) -> Message {
        let mut msg = Message::new(MsgKind::Logon);
        msg.set(FieldId::Username, self.config.username.as_str())
            .set(FieldId::Password, self.config.password.as_str())
            .set(
                FieldId::HeartbeatIntervalSecs,
                self.config.heartbeat_interval.as_secs(),
            )
            .set(FieldId::ResetFlag, self.config.reset_sequence_numbers);
        msg
    }

    /// Performs a local logoff: no venue round-trip, callback fired once.
    async fn finish_local_logoff(&self) {
        if self.monitor.phase() == SessionPhase::LoggedOff {
            return;
        }
        self.set_phase(SessionPhase::LoggedOff);
        let msg = Message::new(MsgKind::Logout);
        self.session.on_logged_off(0, &msg).await;
    }

    /// Error path: consult the handler, then back off or end the session.
    ///
    /// Returns true when the driver should attempt another connection.
    async fn handle_error(&self, err: GwError) -> bool {
        error!(%err, venue = %self.config.venue, "session error");
        self.set_phase(SessionPhase::Error);

        if self.stopping() {
            self.finish_local_logoff().await;
            return false;
        }
        if !err.is_recoverable() {
            self.set_phase(SessionPhase::Disconnected);
            return false;
        }
        if !self.session.on_error(&err).await {
            info!("error handler declined reconnect, ending session");
            self.set_phase(SessionPhase::Disconnected);
            return false;
        }

        let backoff = self.reconnect.lock().next_backoff();
        match backoff {
            Some(delay) => {
                info!(delay_ms = delay.as_millis() as u64, "reconnecting after backoff");
                tokio::select! {
                    _ = tokio::time::sleep(delay) => true,
                    _ = self.shutdown.notified() => {
                        self.finish_local_logoff().await;
                        false
                    }
                }
            }
            None => {
                warn!("reconnect budget exhausted, ending session");
                self.set_phase(SessionPhase::Disconnected);
                false
            }
        }
    }

    /// Allocates a sequence number, encodes, and writes one message.
    async fn write_message(&self, writer: &mut OwnedWriteHalf, mut msg: Message) -> Result<()> {
        let seq = self.seqs.allocate_outbound();
        msg.set(FieldId::MsgSeqNum, seq.value());
        let frame = self.encoder.encode(&msg)?;
        writer
            .write_all(&frame)
            .await
            .map_err(|e| ConnectionError::Dropped {
                reason: e.to_string(),
            })?;
        debug!(kind = %msg.kind(), seq = seq.value(), "msg out");
        self.persist_seqs().await;
        Ok(())
    }

    /// Encodes and writes a message without touching session sequencing.
    ///
    /// The recovery connection keeps its own trivial exchange and must
    /// not consume real-time sequence numbers.
    async fn write_raw(&self, writer: &mut OwnedWriteHalf, msg: &Message) -> Result<()> {
        let frame = self.encoder.encode(msg)?;
        writer
            .write_all(&frame)
            .await
            .map_err(|e| ConnectionError::Dropped {
                reason: e.to_string(),
            })?;
        Ok(())
    }

    /// Services one live connection until logoff, shutdown, or error.
    async fn io_loop(
        &self,
        stream: TcpStream,
        rx: &mut mpsc::UnboundedReceiver<Message>,
    ) -> Result<IoOutcome> {
        let (mut reader, mut writer) = stream.into_split();
        let mut framing = FrameCodec::new().with_max_frame_size(self.config.max_frame_size);
        let mut read_buf = BytesMut::with_capacity(8 * 1024);
        let mut heartbeats = HeartbeatManager::new(self.config.heartbeat_interval);

        self.set_phase(SessionPhase::LoggingOn);
        let mut logon = self.build_logon();
        self.session.on_logging_on(&mut logon).await;
        self.write_message(&mut writer, logon).await?;

        let logon_sent_at = Instant::now();
        let mut logon_deadline = Some(logon_sent_at + self.config.logon_timeout);
        let mut logoff_deadline: Option<Instant> = None;

        let mut ticker = tokio::time::interval(self.config.heartbeat_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                read = reader.read_buf(&mut read_buf) => {
                    let n = read.map_err(|e| ConnectionError::Dropped {
                        reason: e.to_string(),
                    })?;
                    if n == 0 {
                        return Err(ConnectionError::Dropped {
                            reason: "connection closed by venue".to_string(),
                        }
                        .into());
                    }
                    while let Some(frame) = framing.decode(&mut read_buf).map_err(framing_error)? {
                        heartbeats.record_inbound();
                        let msg = self.decoder.decode(&frame)?;
                        match self.handle_inbound(&mut writer, msg).await? {
                            Handled::Continue => {}
                            Handled::LoggedOff => return Ok(IoOutcome::LoggedOff),
                        }
                    }
                    if self.monitor.phase() != SessionPhase::LoggingOn {
                        logon_deadline = None;
                    }
                }
                outbound = rx.recv() => {
                    if let Some(msg) = outbound {
                        self.write_message(&mut writer, msg).await?;
                    }
                }
                _ = ticker.tick() => {
                    let phase = self.monitor.phase();
                    if matches!(phase, SessionPhase::LoggedOn | SessionPhase::LoggingOff) {
                        self.write_message(&mut writer, Message::new(MsgKind::Heartbeat)).await?;
                        if let TickOutcome::Failed { missed } = heartbeats.on_tick() {
                            return Err(ProtocolError::MissedHeartbeats { missed }.into());
                        }
                    }
                }
                _ = self.shutdown.notified() => {
                    if self.monitor.phase() == SessionPhase::LoggingOff {
                        logoff_deadline = Some(Instant::now() + self.config.logon_timeout);
                    } else {
                        return Ok(IoOutcome::Shutdown);
                    }
                }
                _ = sleep_until_opt(logon_deadline), if logon_deadline.is_some() => {
                    return Err(ProtocolError::LogonTimeout {
                        elapsed_ms: logon_sent_at.elapsed().as_millis() as u64,
                    }
                    .into());
                }
                _ = sleep_until_opt(logoff_deadline), if logoff_deadline.is_some() => {
                    warn!("logoff confirmation timed out");
                    return Ok(IoOutcome::Shutdown);
                }
            }
        }
    }

    /// Routes one decoded inbound message through sequencing and dispatch.
    async fn handle_inbound(&self, writer: &mut OwnedWriteHalf, msg: Message) -> Result<Handled> {
        debug!(kind = %msg.kind(), "msg in");

        if self.monitor.phase() == SessionPhase::LoggingOn {
            return self.handle_logon_reply(msg).await;
        }

        // Sequence resets bypass the usual sequence checking.
        if msg.kind() == MsgKind::SequenceReset {
            let seq = msg.seq_num().unwrap_or(0);
            self.messages.on_admin(seq, &msg).await;
            if let Ok(new_seq) = msg.get_u64(FieldId::NewSeq) {
                info!(new_seq, "inbound sequence reset");
                self.seqs.set_inbound(new_seq);
                self.persist_seqs().await;
            }
            return Ok(Handled::Continue);
        }

        let Ok(seq) = msg.seq_num() else {
            self.messages.on_msg(0, &msg).await;
            return Ok(Handled::Continue);
        };

        match self.seqs.validate_inbound(seq) {
            SequenceResult::Ok => {}
            SequenceResult::TooLow { expected, received } => {
                return Err(ProtocolError::SequenceTooLow { expected, received }.into());
            }
            SequenceResult::Gap { expected, received } => {
                self.run_recovery(expected, received).await?;
                self.seqs.set_inbound(received);
            }
        }
        self.seqs.increment_inbound();
        self.persist_seqs().await;

        self.dispatch(writer, seq, msg).await
    }

    /// Handles the venue's response while logging on.
    async fn handle_logon_reply(&self, msg: Message) -> Result<Handled> {
        match msg.kind() {
            MsgKind::LogonReply => {
                let code = msg.get_u64(FieldId::RejectCode).unwrap_or(0);
                if code != 0 {
                    let reason = msg
                        .get_str(FieldId::RejectReason)
                        .unwrap_or("logon rejected")
                        .to_string();
                    return Err(ProtocolError::LogonRejected { code, reason }.into());
                }

                let seq = msg.seq_num().unwrap_or(1);
                if msg
                    .get(FieldId::ResetFlag)
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false)
                {
                    self.seqs.set_inbound(seq);
                }

                self.set_phase(SessionPhase::LoggedOn);
                self.reconnect.lock().reset();
                self.session.on_logged_on(seq, &msg).await;
                info!(venue = %self.config.venue, seq, "logged on");

                match self.seqs.validate_inbound(seq) {
                    SequenceResult::Ok => {
                        self.seqs.increment_inbound();
                    }
                    SequenceResult::TooLow { expected, received } => {
                        return Err(ProtocolError::SequenceTooLow { expected, received }.into());
                    }
                    SequenceResult::Gap { expected, received } => {
                        self.run_recovery(expected, received).await?;
                        self.seqs.set_inbound(received + 1);
                    }
                }
                self.persist_seqs().await;
                Ok(Handled::Continue)
            }
            MsgKind::Logout => {
                let code = msg.get_u64(FieldId::RejectCode).unwrap_or(0);
                let reason = msg
                    .get_str(FieldId::RejectReason)
                    .unwrap_or("logon rejected")
                    .to_string();
                Err(ProtocolError::LogonRejected { code, reason }.into())
            }
            other => Err(ProtocolError::UnexpectedMessage {
                kind: other.to_string(),
                phase: SessionPhase::LoggingOn.to_string(),
            }
            .into()),
        }
    }

    /// Dispatches a sequenced inbound message to its callback.
    async fn dispatch(
        &self,
        writer: &mut OwnedWriteHalf,
        seq: u64,
        msg: Message,
    ) -> Result<Handled> {
        match msg.kind() {
            MsgKind::Heartbeat
            | MsgKind::Reject
            | MsgKind::BusinessReject
            | MsgKind::LogonReply => {
                self.messages.on_admin(seq, &msg).await;
            }
            MsgKind::TestRequest => {
                self.messages.on_admin(seq, &msg).await;
                let mut reply = Message::new(MsgKind::Heartbeat);
                if let Ok(id) = msg.get_str(FieldId::TestReqId) {
                    reply.set(FieldId::TestReqId, id);
                }
                self.write_message(writer, reply).await?;
            }
            MsgKind::ReplayRequest => {
                self.messages.on_admin(seq, &msg).await;
                // No outbound history is kept; hand the venue our next
                // sequence number instead of replaying.
                let mut reply = Message::new(MsgKind::SequenceReset);
                reply.set(FieldId::NewSeq, self.seqs.next_outbound().value() + 1);
                self.write_message(writer, reply).await?;
            }
            MsgKind::Logout => {
                self.messages.on_admin(seq, &msg).await;
                if self.monitor.phase() != SessionPhase::LoggingOff {
                    return Err(ProtocolError::UnsolicitedLogout.into());
                }
                self.set_phase(SessionPhase::LoggedOff);
                self.session.on_logged_off(seq, &msg).await;
                return Ok(Handled::LoggedOff);
            }
            MsgKind::ExecutionReport => {
                let event = self.router.apply_execution(&msg);
                self.dispatch_router_event(event, seq, &msg).await;
            }
            MsgKind::CancelReject => {
                let event = self.router.apply_cancel_reject(&msg);
                self.dispatch_router_event(event, seq, &msg).await;
            }
            _ => {
                self.messages.on_msg(seq, &msg).await;
            }
        }
        Ok(Handled::Continue)
    }

    /// Maps a router decision onto the message callbacks.
    async fn dispatch_router_event(&self, event: RouterEvent, seq: u64, msg: &Message) {
        match event {
            RouterEvent::OrderAck => self.messages.on_order_ack(seq, msg).await,
            RouterEvent::OrderFill => self.messages.on_order_fill(seq, msg).await,
            RouterEvent::OrderDone => self.messages.on_order_done(seq, msg).await,
            RouterEvent::OrderRejected => self.messages.on_order_rejected(seq, msg).await,
            RouterEvent::ModifyAck => self.messages.on_modify_ack(seq, msg).await,
            RouterEvent::ModifyRejected => self.messages.on_modify_rejected(seq, msg).await,
            RouterEvent::CancelRejected => self.messages.on_cancel_rejected(seq, msg).await,
            RouterEvent::Unmatched => self.messages.on_msg(seq, msg).await,
        }
    }

    /// Gap recovery: replay the missing range from the recovery endpoint.
    ///
    /// On success the session is back in LoggedOn; the caller resyncs
    /// the inbound counter and processes the held message.
    async fn run_recovery(&self, expected: u64, received: u64) -> Result<()> {
        warn!(expected, received, "sequence gap detected");
        self.set_phase(SessionPhase::Recovering);
        self.session.on_gap(expected, received).await;

        let Some(recovery) = self.recovery.clone() else {
            warn!("no recovery endpoint configured, resynchronizing without replay");
            self.set_phase(SessionPhase::LoggedOn);
            return Ok(());
        };

        self.replay_from(&recovery, expected, received.saturating_sub(1))
            .await?;
        self.set_phase(SessionPhase::LoggedOn);
        info!(expected, received, "recovery complete");
        Ok(())
    }

    /// Dials the recovery endpoint, authenticates, and replays a range.
    async fn replay_from(&self, endpoint: &Endpoint, begin: u64, end: u64) -> Result<()> {
        let stream = connection::connect(endpoint, self.config.connect_timeout)
            .await
            .map_err(|e| ProtocolError::ReplayFailed {
                reason: e.to_string(),
            })?;
        let (mut reader, mut writer) = stream.into_split();
        let mut framing = FrameCodec::new().with_max_frame_size(self.config.max_frame_size);
        let mut buf = BytesMut::with_capacity(8 * 1024);

        let mut logon = self.build_logon();
        self.session.on_logging_on(&mut logon).await;
        self.write_raw(&mut writer, &logon).await?;

        let reply = self.read_one(&mut reader, &mut framing, &mut buf).await?;
        if reply.kind() != MsgKind::LogonReply
            || reply.get_u64(FieldId::RejectCode).unwrap_or(0) != 0
        {
            return Err(ProtocolError::ReplayFailed {
                reason: "recovery logon rejected".to_string(),
            }
            .into());
        }

        let mut request = Message::new(MsgKind::ReplayRequest);
        request.set(FieldId::BeginSeq, begin).set(FieldId::EndSeq, end);
        self.write_raw(&mut writer, &request).await?;
        info!(begin, end, "replay requested");

        loop {
            let msg = self.read_one(&mut reader, &mut framing, &mut buf).await?;
            match msg.kind() {
                MsgKind::ReplayComplete => return Ok(()),
                MsgKind::Heartbeat => {
                    self.write_raw(&mut writer, &Message::new(MsgKind::Heartbeat))
                        .await?;
                }
                _ => {
                    let seq = msg.seq_num().unwrap_or(0);
                    self.dispatch_replayed(seq, msg).await;
                }
            }
        }
    }

    /// Dispatches one replayed message; no replies on the recovery path.
    async fn dispatch_replayed(&self, seq: u64, msg: Message) {
        match msg.kind() {
            MsgKind::ExecutionReport => {
                let event = self.router.apply_execution(&msg);
                self.dispatch_router_event(event, seq, &msg).await;
            }
            MsgKind::CancelReject => {
                let event = self.router.apply_cancel_reject(&msg);
                self.dispatch_router_event(event, seq, &msg).await;
            }
            kind if kind.is_admin() => self.messages.on_admin(seq, &msg).await,
            _ => self.messages.on_msg(seq, &msg).await,
        }
    }

    /// Reads one message from the recovery connection, bounded in time.
    async fn read_one(
        &self,
        reader: &mut OwnedReadHalf,
        framing: &mut FrameCodec,
        buf: &mut BytesMut,
    ) -> Result<Message> {
        let deadline = Instant::now() + self.config.logon_timeout;
        loop {
            if let Some(frame) = framing.decode(buf).map_err(framing_error)? {
                return Ok(self.decoder.decode(&frame)?);
            }
            let read = tokio::time::timeout_at(deadline, reader.read_buf(buf))
                .await
                .map_err(|_| ProtocolError::ReplayFailed {
                    reason: "replay read timed out".to_string(),
                })?;
            let n = read.map_err(|e| ConnectionError::Dropped {
                reason: e.to_string(),
            })?;
            if n == 0 {
                return Err(ConnectionError::Dropped {
                    reason: "recovery connection closed".to_string(),
                }
                .into());
            }
        }
    }
}

/// Session driver: connect, log on, service the connection, reconnect.
async fn run(core: Arc<Core>) {
    let rx = core.outbound_rx.lock().take();
    let Some(mut rx) = rx else {
        error!("session driver invoked twice");
        return;
    };

    if core.reset_requested.load(Ordering::SeqCst) {
        core.seqs.reset();
        if let Err(err) = core.store.reset().await {
            warn!(%err, "failed to reset sequence store");
        }
    } else {
        match core.store.load().await {
            Ok(seqs) => {
                core.seqs.set_outbound(seqs.outbound);
                core.seqs.set_inbound(seqs.inbound);
            }
            Err(err) => warn!(%err, "failed to load sequence store"),
        }
    }

    loop {
        if core.stopping() {
            core.finish_local_logoff().await;
            break;
        }

        core.set_phase(SessionPhase::Connecting);
        let dialed = tokio::select! {
            result = connection::connect(&core.real_time, core.config.connect_timeout) => result,
            _ = core.shutdown.notified() => {
                core.finish_local_logoff().await;
                break;
            }
        };
        let stream = match dialed {
            Ok(stream) => stream,
            Err(err) => {
                if core.handle_error(err.into()).await {
                    continue;
                }
                break;
            }
        };

        core.session.on_connected().await;

        match core.io_loop(stream, &mut rx).await {
            Ok(IoOutcome::LoggedOff) => break,
            Ok(IoOutcome::Shutdown) => {
                core.finish_local_logoff().await;
                break;
            }
            Err(err) => {
                if core.handle_error(err).await {
                    continue;
                }
                break;
            }
        }
    }

    core.monitor.mark_finished();
    info!(venue = %core.config.venue, "session driver exited");
}

/// Venue connector handle.
///
/// Cheap to clone; all clones drive the same session.
#[derive(Clone)]
pub struct Connector {
    /// Shared connector state.
    core: Arc<Core>,
}

impl Connector {
    /// Returns a builder for configuring a connector.
    #[must_use]
    pub fn builder() -> ConnectorBuilder {
        ConnectorBuilder::new()
    }

    /// Assembles a connector from validated parts.
    pub(crate) fn from_parts(
        config: SessionConfig,
        real_time: Endpoint,
        recovery: Option<Endpoint>,
        session: Arc<dyn SessionHandler>,
        messages: Arc<dyn MessageHandler>,
        store: Arc<dyn SequenceStore>,
        reconnect: ReconnectPolicy,
    ) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let encoder = WireEncoder::new().with_max_frame_size(config.max_frame_size);
        let decoder = WireDecoder::new().with_max_frame_size(config.max_frame_size);

        Self {
            core: Arc::new(Core {
                config,
                real_time,
                recovery,
                session,
                messages,
                store,
                monitor: SessionMonitor::new(),
                seqs: SequenceManager::new(),
                router: OrderRouter::new(),
                reconnect: Mutex::new(reconnect),
                encoder,
                decoder,
                outbound_tx,
                outbound_rx: Mutex::new(Some(outbound_rx)),
                shutdown: Notify::new(),
                stop_requested: AtomicBool::new(false),
                reset_requested: AtomicBool::new(false),
                started: AtomicBool::new(false),
            }),
        }
    }

    /// Returns the current session phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.core.monitor.phase()
    }

    /// Returns the status of a working order.
    ///
    /// # Arguments
    /// * `id` - The client order id, original or replacement
    #[must_use]
    pub fn order_status(&self, id: &ClientOrderId) -> Option<OrderStatus> {
        self.core.router.status(id)
    }

    /// Starts the session driver.
    ///
    /// Runs on the ambient tokio runtime when one is present, otherwise
    /// on a dedicated background thread.
    ///
    /// # Arguments
    /// * `reset` - Reset sequence numbers before connecting
    ///
    /// # Errors
    /// Returns `ConnectionError::AlreadyStarted` on a second call.
    pub fn start(&self, reset: bool) -> Result<()> {
        if self.core.started.swap(true, Ordering::SeqCst) {
            return Err(ConnectionError::AlreadyStarted.into());
        }
        if reset || self.core.config.reset_sequence_numbers {
            self.core.reset_requested.store(true, Ordering::SeqCst);
        }

        let core = Arc::clone(&self.core);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(run(core));
            }
            Err(_) => {
                std::thread::Builder::new()
                    .name("gatewire-io".to_string())
                    .spawn(move || {
                        match tokio::runtime::Builder::new_current_thread()
                            .enable_all()
                            .build()
                        {
                            Ok(runtime) => runtime.block_on(run(core)),
                            Err(err) => {
                                error!(%err, "failed to build io runtime");
                                core.monitor.mark_finished();
                            }
                        }
                    })
                    .map_err(GwError::Io)?;
            }
        }
        Ok(())
    }

    /// Stops the session.
    ///
    /// Idempotent. A logged-on session performs the logoff handshake;
    /// otherwise the session closes locally. Any blocked
    /// [`Connector::wait_for_logon`] caller is released.
    pub fn stop(&self) -> Result<()> {
        if self.core.stop_requested.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!(venue = %self.core.config.venue, "stop requested");

        if !self.core.started.load(Ordering::SeqCst) {
            self.core.set_phase(SessionPhase::LoggedOff);
            self.core.monitor.mark_finished();
            return Ok(());
        }

        if self.core.monitor.phase() == SessionPhase::LoggedOn {
            self.core.set_phase(SessionPhase::LoggingOff);
            if self
                .core
                .outbound_tx
                .send(Message::new(MsgKind::Logout))
                .is_err()
            {
                warn!("logout could not be queued, closing locally");
            }
        }
        self.core.shutdown.notify_one();
        Ok(())
    }

    /// Blocks the calling thread until logon completes or the session ends.
    ///
    /// Returns true if the session reached LoggedOn. Always returns
    /// once `stop` is called, even when logon never completes.
    ///
    /// # Arguments
    /// * `timeout` - Optional bound on the wait
    #[must_use]
    pub fn wait_for_logon(&self, timeout: Option<Duration>) -> bool {
        self.core.monitor.wait_for_logon(timeout)
    }

    /// Waits asynchronously until logon completes or the session ends.
    pub async fn logged_on(&self) -> bool {
        let mut rx = self.core.monitor.subscribe();
        loop {
            if *rx.borrow() == SessionPhase::LoggedOn {
                return true;
            }
            if self.core.monitor.is_finished() || self.core.monitor.phase().is_terminal() {
                return false;
            }
            if rx.changed().await.is_err() {
                return false;
            }
        }
    }

    /// Submits a new order.
    ///
    /// The request is validated and registered locally, then queued to
    /// the I/O task. Success means accepted for transmission; the
    /// venue's answer arrives through the message callbacks.
    ///
    /// # Arguments
    /// * `ticket` - The order request
    ///
    /// # Errors
    /// Returns `ConnectionError::NotReady` when the session is not
    /// logged on, or a `ValidationError` for a bad request.
    pub fn send_order(&self, ticket: &OrderTicket) -> Result<()> {
        self.core.ensure_ready()?;
        self.core.router.register_order(ticket)?;
        let mut msg = ticket.to_message();
        stamp_transact_time(&mut msg);
        self.core.enqueue(msg)
    }

    /// Submits a modify against a working order.
    ///
    /// # Arguments
    /// * `ticket` - The modify request
    ///
    /// # Errors
    /// Same failure modes as [`Connector::send_order`], plus validation
    /// of the referenced order's state.
    pub fn send_modify(&self, ticket: &ModifyTicket) -> Result<()> {
        self.core.ensure_ready()?;
        self.core.router.register_modify(ticket)?;
        let mut msg = ticket.to_message();
        stamp_transact_time(&mut msg);
        self.core.enqueue(msg)
    }

    /// Submits a cancel against a working order.
    ///
    /// # Arguments
    /// * `ticket` - The cancel request
    ///
    /// # Errors
    /// Same failure modes as [`Connector::send_modify`].
    pub fn send_cancel(&self, ticket: &CancelTicket) -> Result<()> {
        self.core.ensure_ready()?;
        self.core.router.register_cancel(ticket)?;
        let mut msg = ticket.to_message();
        stamp_transact_time(&mut msg);
        self.core.enqueue(msg)
    }

    /// Submits a free-form message.
    ///
    /// The sequence number is stamped by the I/O task; order tracking
    /// is bypassed.
    ///
    /// # Arguments
    /// * `msg` - The message to send
    ///
    /// # Errors
    /// Returns `ConnectionError::NotReady` when the session is not
    /// logged on.
    pub fn send_msg(&self, msg: Message) -> Result<()> {
        self.core.ensure_ready()?;
        self.core.enqueue(msg)
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("venue", &self.core.config.venue)
            .field("phase", &self.core.monitor.phase())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gatewire_core::error::ValidationError;
    use gatewire_core::types::{OrdType, Side};
    use rust_decimal::Decimal;
    use tokio::net::TcpListener;
    use tokio::time::timeout;
    use tokio_util::codec::Decoder as _;

    const WAIT: Duration = Duration::from_secs(5);

    /// Everything the recorder saw, in arrival order.
    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Connected,
        LoggingOn,
        LoggedOn(u64),
        LoggedOff(u64),
        Gap(u64, u64),
        Error(String),
        Admin(u64),
        OrderAck(u64),
        OrderFill(u64),
        OrderDone(u64),
        OrderRejected(u64),
        ModifyAck(u64),
        ModifyRejected(u64),
        CancelRejected(u64),
        Msg(u64),
    }

    /// Handler recording every callback into a channel.
    struct Recorder {
        tx: mpsc::UnboundedSender<Event>,
        reconnect: bool,
    }

    impl Recorder {
        fn new(reconnect: bool) -> (Arc<Self>, mpsc::UnboundedReceiver<Event>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (Arc::new(Self { tx, reconnect }), rx)
        }

        fn push(&self, event: Event) {
            let _ = self.tx.send(event);
        }
    }

    #[async_trait]
    impl SessionHandler for Recorder {
        async fn on_connected(&self) {
            self.push(Event::Connected);
        }

        async fn on_logging_on(&self, msg: &mut Message) {
            msg.set(FieldId::Account, "DESK1");
            self.push(Event::LoggingOn);
        }

        async fn on_error(&self, error: &GwError) -> bool {
            self.push(Event::Error(error.to_string()));
            self.reconnect
        }

        async fn on_logged_on(&self, seq: u64, _msg: &Message) {
            self.push(Event::LoggedOn(seq));
        }

        async fn on_logged_off(&self, seq: u64, _msg: &Message) {
            self.push(Event::LoggedOff(seq));
        }

        async fn on_gap(&self, expected: u64, received: u64) {
            self.push(Event::Gap(expected, received));
        }
    }

    #[async_trait]
    impl MessageHandler for Recorder {
        async fn on_admin(&self, seq: u64, _msg: &Message) {
            self.push(Event::Admin(seq));
        }

        async fn on_order_ack(&self, seq: u64, _msg: &Message) {
            self.push(Event::OrderAck(seq));
        }

        async fn on_order_rejected(&self, seq: u64, _msg: &Message) {
            self.push(Event::OrderRejected(seq));
        }

        async fn on_order_done(&self, seq: u64, _msg: &Message) {
            self.push(Event::OrderDone(seq));
        }

        async fn on_order_fill(&self, seq: u64, _msg: &Message) {
            self.push(Event::OrderFill(seq));
        }

        async fn on_modify_ack(&self, seq: u64, _msg: &Message) {
            self.push(Event::ModifyAck(seq));
        }

        async fn on_modify_rejected(&self, seq: u64, _msg: &Message) {
            self.push(Event::ModifyRejected(seq));
        }

        async fn on_cancel_rejected(&self, seq: u64, _msg: &Message) {
            self.push(Event::CancelRejected(seq));
        }

        async fn on_msg(&self, seq: u64, _msg: &Message) {
            self.push(Event::Msg(seq));
        }
    }

    /// One accepted connection on the venue side of a test.
    struct VenueConn {
        stream: TcpStream,
        framing: FrameCodec,
        buf: BytesMut,
    }

    impl VenueConn {
        async fn accept(listener: &TcpListener) -> Self {
            let (stream, _) = timeout(WAIT, listener.accept())
                .await
                .expect("accept timed out")
                .expect("accept failed");
            Self {
                stream,
                framing: FrameCodec::new(),
                buf: BytesMut::with_capacity(4096),
            }
        }

        async fn read_msg(&mut self) -> Message {
            loop {
                if let Some(frame) = self.framing.decode(&mut self.buf).expect("bad frame") {
                    return WireDecoder::new().decode(&frame).expect("bad message");
                }
                let n = timeout(WAIT, self.stream.read_buf(&mut self.buf))
                    .await
                    .expect("read timed out")
                    .expect("read failed");
                assert!(n > 0, "connector closed the connection");
            }
        }

        async fn send(&mut self, msg: &Message) {
            let frame = WireEncoder::new().encode(msg).expect("encode failed");
            self.stream.write_all(&frame).await.expect("write failed");
        }
    }

    async fn expect<F>(events: &mut mpsc::UnboundedReceiver<Event>, pred: F) -> Event
    where
        F: Fn(&Event) -> bool,
    {
        loop {
            let event = timeout(WAIT, events.recv())
                .await
                .expect("timed out waiting for event")
                .expect("event channel closed");
            if pred(&event) {
                return event;
            }
        }
    }

    fn id(s: &str) -> ClientOrderId {
        ClientOrderId::new(s).unwrap()
    }

    fn exec(clord: &str, exec_type: char, seq: u64) -> Message {
        Message::new(MsgKind::ExecutionReport)
            .with(FieldId::MsgSeqNum, seq)
            .with(FieldId::ClOrdId, clord)
            .with(FieldId::ExecType, exec_type)
    }

    fn logon_reply(seq: u64) -> Message {
        Message::new(MsgKind::LogonReply)
            .with(FieldId::MsgSeqNum, seq)
            .with(FieldId::RejectCode, 0u64)
    }

    async fn setup(
        reconnect: bool,
        recovery: Option<String>,
    ) -> (Connector, mpsc::UnboundedReceiver<Event>, TcpListener) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (recorder, events) = Recorder::new(reconnect);

        let mut config = SessionConfig::new("TESTV", addr.to_string(), "user", "secret");
        config.recovery_endpoint = recovery;

        let connector = Connector::builder()
            .with_config(config)
            .with_session_handler(recorder.clone())
            .with_message_handler(recorder)
            .build()
            .unwrap();
        (connector, events, listener)
    }

    #[tokio::test]
    async fn test_logon_order_modify_cancel_flow() {
        let (connector, mut events, listener) = setup(false, None).await;
        connector.start(false).unwrap();
        assert!(matches!(
            connector.start(false),
            Err(GwError::Connection(ConnectionError::AlreadyStarted))
        ));

        let mut venue = VenueConn::accept(&listener).await;

        let logon = venue.read_msg().await;
        assert_eq!(logon.kind(), MsgKind::Logon);
        assert_eq!(logon.seq_num().unwrap(), 1);
        assert_eq!(logon.get_str(FieldId::Username).unwrap(), "user");
        assert_eq!(logon.get_str(FieldId::Password).unwrap(), "secret");
        // Decorated by the handler before sending.
        assert_eq!(logon.get_str(FieldId::Account).unwrap(), "DESK1");

        venue.send(&logon_reply(1)).await;
        assert!(timeout(WAIT, connector.logged_on()).await.unwrap());
        assert_eq!(connector.phase(), SessionPhase::LoggedOn);
        expect(&mut events, |e| *e == Event::Connected).await;
        expect(&mut events, |e| *e == Event::LoggedOn(1)).await;

        // New order.
        let ticket = OrderTicket::new(id("o1"), 133_215, Side::Buy, 1000, OrdType::Limit)
            .with_price(Decimal::new(123_456, 2));
        connector.send_order(&ticket).unwrap();

        let order = venue.read_msg().await;
        assert_eq!(order.kind(), MsgKind::NewOrder);
        assert_eq!(order.seq_num().unwrap(), 2);
        assert_eq!(order.get_str(FieldId::ClOrdId).unwrap(), "o1");
        assert_eq!(order.qty().unwrap(), 1000);
        assert!(order.contains(FieldId::TransactTime));

        venue.send(&exec("o1", '0', 2)).await;
        expect(&mut events, |e| *e == Event::OrderAck(2)).await;
        assert_eq!(
            connector.order_status(&id("o1")),
            Some(OrderStatus::Acknowledged)
        );

        // Modify referencing an unknown order fails locally.
        let bad = ModifyTicket::new(id("ghost"), id("x1"), 1);
        assert!(matches!(
            connector.send_modify(&bad),
            Err(GwError::Validation(ValidationError::UnknownOrder { .. }))
        ));

        // Modify the acknowledged order.
        connector
            .send_modify(&ModifyTicket::new(id("o1"), id("o2"), 2000))
            .unwrap();
        let modify = venue.read_msg().await;
        assert_eq!(modify.kind(), MsgKind::ModifyOrder);
        assert_eq!(modify.seq_num().unwrap(), 3);
        assert_eq!(modify.get_str(FieldId::OrigClOrdId).unwrap(), "o1");
        assert_eq!(modify.get_str(FieldId::ClOrdId).unwrap(), "o2");

        venue.send(&exec("o2", '5', 3)).await;
        expect(&mut events, |e| *e == Event::ModifyAck(3)).await;
        assert_eq!(
            connector.order_status(&id("o2")),
            Some(OrderStatus::Acknowledged)
        );

        // Cancel the replaced order.
        connector
            .send_cancel(&CancelTicket::new(id("o2"), id("o3")))
            .unwrap();
        let cancel = venue.read_msg().await;
        assert_eq!(cancel.kind(), MsgKind::CancelOrder);
        assert_eq!(cancel.seq_num().unwrap(), 4);

        venue.send(&exec("o3", '4', 4)).await;
        expect(&mut events, |e| *e == Event::OrderDone(4)).await;
        assert_eq!(
            connector.order_status(&id("o2")),
            Some(OrderStatus::Cancelled)
        );
    }

    #[tokio::test]
    async fn test_test_request_echoed_as_heartbeat() {
        let (connector, mut events, listener) = setup(false, None).await;
        connector.start(false).unwrap();

        let mut venue = VenueConn::accept(&listener).await;
        let _ = venue.read_msg().await;
        venue.send(&logon_reply(1)).await;
        assert!(timeout(WAIT, connector.logged_on()).await.unwrap());

        venue
            .send(
                &Message::new(MsgKind::TestRequest)
                    .with(FieldId::MsgSeqNum, 2u64)
                    .with(FieldId::TestReqId, "T1"),
            )
            .await;

        let reply = venue.read_msg().await;
        assert_eq!(reply.kind(), MsgKind::Heartbeat);
        assert_eq!(reply.get_str(FieldId::TestReqId).unwrap(), "T1");
        expect(&mut events, |e| *e == Event::Admin(2)).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_wait_for_logon_returns_on_stop() {
        let (connector, mut events, listener) = setup(false, None).await;
        connector.start(false).unwrap();

        // Venue accepts and reads the logon, then stays silent.
        let mut venue = VenueConn::accept(&listener).await;
        let _ = venue.read_msg().await;

        let waiter = tokio::task::spawn_blocking({
            let connector = connector.clone();
            move || connector.wait_for_logon(None)
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        connector.stop().unwrap();

        assert!(!waiter.await.unwrap());
        expect(&mut events, |e| *e == Event::LoggedOff(0)).await;
        assert_eq!(connector.phase(), SessionPhase::LoggedOff);
        // Idempotent.
        connector.stop().unwrap();
    }

    #[tokio::test]
    async fn test_logon_reject_ends_session() {
        let (connector, mut events, listener) = setup(false, None).await;
        connector.start(false).unwrap();

        let mut venue = VenueConn::accept(&listener).await;
        let _ = venue.read_msg().await;
        venue
            .send(
                &Message::new(MsgKind::LogonReply)
                    .with(FieldId::MsgSeqNum, 1u64)
                    .with(FieldId::RejectCode, 5u64)
                    .with(FieldId::RejectReason, "bad credentials"),
            )
            .await;

        let event = expect(&mut events, |e| matches!(e, Event::Error(_))).await;
        if let Event::Error(text) = event {
            assert!(text.contains("logon rejected"));
        }
        assert!(!timeout(WAIT, connector.logged_on()).await.unwrap());
        assert_eq!(connector.phase(), SessionPhase::Disconnected);
    }

    #[tokio::test]
    async fn test_gap_triggers_recovery_replay() {
        let recovery_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let recovery_addr = recovery_listener.local_addr().unwrap();
        let (connector, mut events, listener) =
            setup(false, Some(recovery_addr.to_string())).await;
        connector.start(false).unwrap();

        let mut venue = VenueConn::accept(&listener).await;
        let _ = venue.read_msg().await;
        venue.send(&logon_reply(1)).await;
        assert!(timeout(WAIT, connector.logged_on()).await.unwrap());

        // Jump from expected seq 2 to 5.
        venue.send(&exec("ghost", '0', 5)).await;

        expect(&mut events, |e| *e == Event::Gap(2, 5)).await;
        assert_eq!(connector.phase(), SessionPhase::Recovering);

        let mut recovery = VenueConn::accept(&recovery_listener).await;
        let rlogon = recovery.read_msg().await;
        assert_eq!(rlogon.kind(), MsgKind::Logon);
        recovery
            .send(&Message::new(MsgKind::LogonReply).with(FieldId::RejectCode, 0u64))
            .await;

        let request = recovery.read_msg().await;
        assert_eq!(request.kind(), MsgKind::ReplayRequest);
        assert_eq!(request.get_u64(FieldId::BeginSeq).unwrap(), 2);
        assert_eq!(request.get_u64(FieldId::EndSeq).unwrap(), 4);

        for seq in 2..=4 {
            recovery.send(&exec("ghost", '0', seq)).await;
        }
        recovery.send(&Message::new(MsgKind::ReplayComplete)).await;

        // Replayed messages, then the held real-time message.
        for seq in 2..=5 {
            expect(&mut events, |e| *e == Event::Msg(seq)).await;
        }
        assert_eq!(connector.phase(), SessionPhase::LoggedOn);

        // Sequence is resynchronized; the next message dispatches normally.
        venue.send(&exec("ghost", '0', 6)).await;
        expect(&mut events, |e| *e == Event::Msg(6)).await;
    }

    #[tokio::test]
    async fn test_stop_performs_logoff_handshake() {
        let (connector, mut events, listener) = setup(false, None).await;
        connector.start(false).unwrap();

        let mut venue = VenueConn::accept(&listener).await;
        let _ = venue.read_msg().await;
        venue.send(&logon_reply(1)).await;
        assert!(timeout(WAIT, connector.logged_on()).await.unwrap());

        connector.stop().unwrap();

        let logout = venue.read_msg().await;
        assert_eq!(logout.kind(), MsgKind::Logout);
        assert_eq!(logout.seq_num().unwrap(), 2);

        venue
            .send(&Message::new(MsgKind::Logout).with(FieldId::MsgSeqNum, 2u64))
            .await;

        expect(&mut events, |e| *e == Event::LoggedOff(2)).await;
        assert_eq!(connector.phase(), SessionPhase::LoggedOff);
    }

    #[tokio::test]
    async fn test_send_before_logon_not_ready() {
        let (connector, _events, _listener) = setup(false, None).await;

        let ticket = OrderTicket::new(id("o1"), 1, Side::Buy, 100, OrdType::Market);
        assert!(matches!(
            connector.send_order(&ticket),
            Err(GwError::Connection(ConnectionError::NotReady))
        ));
    }
}
