/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! Session state machine.
//!
//! This module implements the runtime state machine for venue sessions.
//! Transitions are validated against an explicit table; callers observe
//! the current phase, block on logon completion, or subscribe to phase
//! changes asynchronously.

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::watch;

/// Session lifecycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    /// No connection established.
    #[default]
    Disconnected,
    /// TCP connection in progress.
    Connecting,
    /// Logon sent, awaiting the venue's reply.
    LoggingOn,
    /// Session fully established.
    LoggedOn,
    /// Gap detected, replaying missed messages.
    Recovering,
    /// Logout sent, awaiting confirmation.
    LoggingOff,
    /// Session ended by logoff. Terminal.
    LoggedOff,
    /// Session failed; may retry or end permanently.
    Error,
}

impl SessionPhase {
    /// Returns true if no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::LoggedOff)
    }

    /// Returns true if the session accepts application sends.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::LoggedOn)
    }

    /// Returns true if `to` is a legal next phase.
    ///
    /// # Arguments
    /// * `to` - The candidate next phase
    #[must_use]
    pub const fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Disconnected, Self::Connecting)
                | (Self::Disconnected, Self::LoggedOff)
                | (Self::Connecting, Self::LoggingOn)
                | (Self::Connecting, Self::Error)
                | (Self::Connecting, Self::LoggedOff)
                | (Self::LoggingOn, Self::LoggedOn)
                | (Self::LoggingOn, Self::Error)
                | (Self::LoggingOn, Self::LoggedOff)
                | (Self::LoggedOn, Self::Recovering)
                | (Self::LoggedOn, Self::LoggingOff)
                | (Self::LoggedOn, Self::Error)
                | (Self::Recovering, Self::LoggedOn)
                | (Self::Recovering, Self::Error)
                | (Self::Recovering, Self::LoggedOff)
                | (Self::LoggingOff, Self::LoggedOff)
                | (Self::LoggingOff, Self::Error)
                | (Self::Error, Self::Connecting)
                | (Self::Error, Self::Disconnected)
                | (Self::Error, Self::LoggedOff)
        )
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error raised on an illegal phase transition.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid session transition: {from} -> {to}")]
pub struct InvalidTransition {
    /// The phase the session was in.
    pub from: SessionPhase,
    /// The phase that was requested.
    pub to: SessionPhase,
}

/// Interior state guarded by the monitor mutex.
#[derive(Debug, Default)]
struct MonitorState {
    /// Current session phase.
    phase: SessionPhase,
    /// Whether LoggedOn was ever reached this session.
    logged_on_seen: bool,
    /// Whether the session driver has exited.
    finished: bool,
}

/// Shared, observable session state.
///
/// The I/O task drives transitions; caller threads block on
/// [`SessionMonitor::wait_for_logon`] or watch phase changes through
/// [`SessionMonitor::subscribe`].
#[derive(Debug)]
pub struct SessionMonitor {
    /// Guarded phase and flags.
    state: Mutex<MonitorState>,
    /// Wakes blocking waiters on every change.
    condvar: Condvar,
    /// Broadcasts the phase to async observers.
    watch_tx: watch::Sender<SessionPhase>,
}

impl SessionMonitor {
    /// Creates a monitor in the Disconnected phase.
    #[must_use]
    pub fn new() -> Self {
        let (watch_tx, _) = watch::channel(SessionPhase::Disconnected);
        Self {
            state: Mutex::new(MonitorState::default()),
            condvar: Condvar::new(),
            watch_tx,
        }
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.lock().phase
    }

    /// Applies a phase transition.
    ///
    /// # Arguments
    /// * `to` - The next phase
    ///
    /// # Errors
    /// Returns [`InvalidTransition`] when the transition table forbids
    /// the move; the phase is left unchanged.
    pub fn transition(&self, to: SessionPhase) -> Result<(), InvalidTransition> {
        let mut state = self.state.lock();
        let from = state.phase;
        if from == to {
            return Ok(());
        }
        if !from.can_transition(to) {
            return Err(InvalidTransition { from, to });
        }

        tracing::debug!(%from, %to, "session phase transition");
        state.phase = to;
        if to == SessionPhase::LoggedOn {
            state.logged_on_seen = true;
        }
        drop(state);

        let _ = self.watch_tx.send(to);
        self.condvar.notify_all();
        Ok(())
    }

    /// Marks the session driver as exited and wakes all waiters.
    ///
    /// Async observers are woken too: the current phase is re-sent on
    /// the watch channel so `changed()` futures complete.
    pub fn mark_finished(&self) {
        let mut state = self.state.lock();
        state.finished = true;
        let phase = state.phase;
        drop(state);
        let _ = self.watch_tx.send(phase);
        self.condvar.notify_all();
    }

    /// Returns true if the session driver has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.lock().finished
    }

    /// Blocks the calling thread until logon completes or the session ends.
    ///
    /// Returns true if the session reached LoggedOn. Returns false when
    /// the session ends without logging on, or when the timeout elapses.
    /// The wait always ends when the driver exits, so callers are never
    /// blocked past shutdown.
    ///
    /// # Arguments
    /// * `timeout` - Optional bound on the wait
    #[must_use]
    pub fn wait_for_logon(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.state.lock();

        loop {
            if state.logged_on_seen {
                return true;
            }
            if state.finished || state.phase.is_terminal() {
                return false;
            }

            match deadline {
                Some(deadline) => {
                    if self.condvar.wait_until(&mut state, deadline).timed_out() {
                        return state.logged_on_seen;
                    }
                }
                None => self.condvar.wait(&mut state),
            }
        }
    }

    /// Returns a watch receiver observing phase changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.watch_tx.subscribe()
    }
}

impl Default for SessionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_phase_transitions_happy_path() {
        let monitor = SessionMonitor::new();
        assert_eq!(monitor.phase(), SessionPhase::Disconnected);

        monitor.transition(SessionPhase::Connecting).unwrap();
        monitor.transition(SessionPhase::LoggingOn).unwrap();
        monitor.transition(SessionPhase::LoggedOn).unwrap();
        monitor.transition(SessionPhase::LoggingOff).unwrap();
        monitor.transition(SessionPhase::LoggedOff).unwrap();

        assert!(monitor.phase().is_terminal());
    }

    #[test]
    fn test_recovery_round_trip() {
        let monitor = SessionMonitor::new();
        monitor.transition(SessionPhase::Connecting).unwrap();
        monitor.transition(SessionPhase::LoggingOn).unwrap();
        monitor.transition(SessionPhase::LoggedOn).unwrap();

        monitor.transition(SessionPhase::Recovering).unwrap();
        monitor.transition(SessionPhase::LoggedOn).unwrap();
        assert_eq!(monitor.phase(), SessionPhase::LoggedOn);
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let monitor = SessionMonitor::new();
        let err = monitor.transition(SessionPhase::LoggedOn).unwrap_err();
        assert_eq!(err.from, SessionPhase::Disconnected);
        assert_eq!(err.to, SessionPhase::LoggedOn);
        assert_eq!(monitor.phase(), SessionPhase::Disconnected);
    }

    #[test]
    fn test_terminal_phase_refuses_transitions() {
        let monitor = SessionMonitor::new();
        monitor.transition(SessionPhase::LoggedOff).unwrap();
        assert!(monitor.transition(SessionPhase::Connecting).is_err());
    }

    #[test]
    fn test_wait_for_logon_wakes_on_transition() {
        let monitor = Arc::new(SessionMonitor::new());
        monitor.transition(SessionPhase::Connecting).unwrap();
        monitor.transition(SessionPhase::LoggingOn).unwrap();

        let waiter = {
            let monitor = Arc::clone(&monitor);
            std::thread::spawn(move || monitor.wait_for_logon(Some(Duration::from_secs(5))))
        };

        std::thread::sleep(Duration::from_millis(20));
        monitor.transition(SessionPhase::LoggedOn).unwrap();

        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_wait_for_logon_unblocked_by_finish() {
        let monitor = Arc::new(SessionMonitor::new());

        let waiter = {
            let monitor = Arc::clone(&monitor);
            std::thread::spawn(move || monitor.wait_for_logon(Some(Duration::from_secs(5))))
        };

        std::thread::sleep(Duration::from_millis(20));
        monitor.mark_finished();

        assert!(!waiter.join().unwrap());
    }

    #[test]
    fn test_wait_for_logon_timeout() {
        let monitor = SessionMonitor::new();
        assert!(!monitor.wait_for_logon(Some(Duration::from_millis(20))));
    }

    #[test]
    fn test_wait_for_logon_after_logon_returns_immediately() {
        let monitor = SessionMonitor::new();
        monitor.transition(SessionPhase::Connecting).unwrap();
        monitor.transition(SessionPhase::LoggingOn).unwrap();
        monitor.transition(SessionPhase::LoggedOn).unwrap();

        // Already logged on; no blocking.
        assert!(monitor.wait_for_logon(None));
    }

    #[tokio::test]
    async fn test_subscribe_observes_phases() {
        let monitor = SessionMonitor::new();
        let mut rx = monitor.subscribe();

        monitor.transition(SessionPhase::Connecting).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), SessionPhase::Connecting);
    }
}
