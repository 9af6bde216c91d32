use std::sync::OnceLock;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::error::MuxError;

/// Coalesced edge-triggered wake-up with capacity one.
///
/// `notify` never blocks: a post while one is already pending is
/// dropped, so N posts before a wait wake exactly one wait. The
/// receiver side is exposed so waiters can race it against other
/// channels with `select!`.
pub(crate) struct Signal {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl Signal {
    pub(crate) fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self { tx, rx }
    }

    /// Post a wake-up; duplicates coalesce.
    pub(crate) fn notify(&self) {
        let _ = self.tx.try_send(());
    }

    /// A handle to the wake-up channel, for racing in `select!`.
    pub(crate) fn receiver(&self) -> Receiver<()> {
        self.rx.clone()
    }
}

/// Single-shot terminal error for a session.
///
/// The first `raise` wins; later raises are discarded. Unlike a plain
/// capacity-one channel, the stored error stays observable through
/// `get` forever, so every `receive` after shutdown keeps failing
/// instead of hanging.
pub(crate) struct ErrorSlot {
    slot: OnceLock<MuxError>,
    signal: Signal,
}

impl ErrorSlot {
    pub(crate) fn new() -> Self {
        Self {
            slot: OnceLock::new(),
            signal: Signal::new(),
        }
    }

    /// Store the terminal error and wake a waiter. No-op if an error
    /// has already been raised.
    pub(crate) fn raise(&self, err: MuxError) {
        if self.slot.set(err).is_ok() {
            self.signal.notify();
        }
    }

    /// The stored error, if one has been raised.
    pub(crate) fn get(&self) -> Option<MuxError> {
        self.slot.get().cloned()
    }

    /// A handle to the raise notification channel, for `select!`.
    pub(crate) fn receiver(&self) -> Receiver<()> {
        self.signal.receiver()
    }
}
