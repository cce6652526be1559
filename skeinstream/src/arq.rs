//! Stop-and-wait ARQ signalling between the radio context and the stream.
//!
//! The transmit-confirmation flag is the single point of cross-context
//! communication: the radio layer writes it through a [`TxNotifier`], the
//! stream blocks on it through `TxSignal::wait_until`. No multi-field
//! invariant spans the flag, so a mutex-guarded state word plus a condvar
//! is all the synchronisation there is -- the wait is a real block with a
//! deadline, not a fixed-sleep polling loop.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

use crate::radio::TxError;

/// Per-attempt ARQ state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArqState {
    /// No transmit outstanding.
    Idle,
    /// A frame has been handed to the radio; outcome unknown.
    AwaitingConfirmation,
    /// The radio reported the attempt as delivered.
    Confirmed,
    /// The radio reported the attempt as failed.
    Failed,
}

impl fmt::Display for ArqState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArqState::Idle => write!(f, "Idle"),
            ArqState::AwaitingConfirmation => write!(f, "AwaitingConfirmation"),
            ArqState::Confirmed => write!(f, "Confirmed"),
            ArqState::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: ArqState,
    last_error: Option<TxError>,
}

#[derive(Debug)]
struct Shared {
    inner: Mutex<Inner>,
    cond: Condvar,
    /// Cleared on session teardown; late notifications become no-ops.
    live: AtomicBool,
}

impl Shared {
    fn set(&self, state: ArqState, error: Option<TxError>) {
        let mut inner = self.inner.lock();
        inner.state = state;
        inner.last_error = error;
        drop(inner);
        self.cond.notify_all();
    }
}

/// Session-side handle to the shared confirmation state.
#[derive(Debug)]
pub(crate) struct TxSignal {
    shared: Arc<Shared>,
}

impl TxSignal {
    pub(crate) fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: ArqState::Idle,
                    last_error: None,
                }),
                cond: Condvar::new(),
                live: AtomicBool::new(true),
            }),
        }
    }

    /// Capability for the radio layer, bound to this session.
    pub(crate) fn notifier(&self) -> TxNotifier {
        TxNotifier {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Mark a fresh attempt in flight. Called before handing the frame to
    /// the radio so a fast notification cannot be lost.
    pub(crate) fn arm(&self) {
        self.shared.set(ArqState::AwaitingConfirmation, None);
    }

    /// Record a failure from the session's own context, e.g. the radio
    /// rejected the frame synchronously.
    pub(crate) fn fail(&self, error: TxError) {
        self.shared.set(ArqState::Failed, Some(error));
    }

    /// Return to Idle between attempts.
    pub(crate) fn reset(&self) {
        self.shared.set(ArqState::Idle, None);
    }

    /// Block until the in-flight attempt resolves or `deadline` passes.
    ///
    /// A return of `AwaitingConfirmation` means the deadline expired first.
    pub(crate) fn wait_until(&self, deadline: Instant) -> ArqState {
        let mut inner = self.shared.inner.lock();
        while inner.state == ArqState::AwaitingConfirmation {
            if self.shared.cond.wait_until(&mut inner, deadline).timed_out() {
                break;
            }
        }
        inner.state
    }

    pub(crate) fn state(&self) -> ArqState {
        self.shared.inner.lock().state
    }

    pub(crate) fn last_error(&self) -> Option<TxError> {
        self.shared.inner.lock().last_error
    }

    /// Tear the session down: every notification from here on is ignored.
    pub(crate) fn retire(&self) {
        self.shared.live.store(false, Ordering::Release);
    }
}

/// Capability handed to the radio layer for reporting transmit outcomes.
///
/// Clone freely; all clones reference the same session. Notifications
/// arriving after the session has been dropped are no-ops.
#[derive(Debug, Clone)]
pub struct TxNotifier {
    shared: Arc<Shared>,
}

impl TxNotifier {
    /// Report the in-flight attempt as delivered.
    pub fn transmit_done(&self) {
        if !self.shared.live.load(Ordering::Acquire) {
            return;
        }
        self.shared.set(ArqState::Confirmed, None);
    }

    /// Report the in-flight attempt as failed.
    pub fn transmit_failed(&self, error: TxError) {
        if !self.shared.live.load(Ordering::Acquire) {
            return;
        }
        self.shared.set(ArqState::Failed, Some(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn confirmation_wakes_waiter() {
        let signal = TxSignal::new();
        let notifier = signal.notifier();
        signal.arm();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            notifier.transmit_done();
        });

        let outcome = signal.wait_until(Instant::now() + Duration::from_secs(5));
        assert_eq!(outcome, ArqState::Confirmed);
        handle.join().unwrap();
    }

    #[test]
    fn failure_carries_the_error() {
        let signal = TxSignal::new();
        let notifier = signal.notifier();
        signal.arm();
        notifier.transmit_failed(TxError::NoAck);

        let outcome = signal.wait_until(Instant::now() + Duration::from_secs(1));
        assert_eq!(outcome, ArqState::Failed);
        assert_eq!(signal.last_error(), Some(TxError::NoAck));
    }

    #[test]
    fn deadline_expiry_reports_still_waiting() {
        let signal = TxSignal::new();
        signal.arm();
        let outcome = signal.wait_until(Instant::now() + Duration::from_millis(10));
        assert_eq!(outcome, ArqState::AwaitingConfirmation);
    }

    #[test]
    fn retired_session_ignores_notifications() {
        let signal = TxSignal::new();
        let notifier = signal.notifier();
        signal.arm();
        signal.retire();

        notifier.transmit_done();
        assert_eq!(signal.state(), ArqState::AwaitingConfirmation);

        notifier.transmit_failed(TxError::Abort);
        assert_eq!(signal.state(), ArqState::AwaitingConfirmation);
        assert_eq!(signal.last_error(), None);
    }
}
