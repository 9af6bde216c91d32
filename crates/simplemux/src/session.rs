use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Weak;
use std::time::{Duration, Instant};

use crossbeam_channel::select;
use simplemux_frame::Frame;
use tracing::debug;

use crate::error::{MuxError, Result};
use crate::mux::MuxInner;
use crate::queue::FrameQueue;
use crate::signal::{ErrorSlot, Signal};

/// One logical stream over the multiplexer's shared connection.
///
/// Sessions are created with [`crate::Mux::new_session`] and act like
/// independent connections: each has its own inbound frame queue, fed
/// by the mux reader thread, keyed on the session id the peer echoes
/// back in its headers.
///
/// A session is single-consumer: one task is expected to call
/// [`receive`](Session::receive) at a time. `send` may be called from
/// any number of tasks; writes are serialized on the mux's transport
/// writer lock.
pub struct Session {
    id: u64,
    mux: Weak<MuxInner>,
    pub(crate) queue: FrameQueue,
    pub(crate) noti: Signal,
    pub(crate) err: ErrorSlot,
    recv_timeout_nanos: AtomicU64,
    closed: AtomicBool,
}

impl Session {
    pub(crate) fn new(id: u64, mux: Weak<MuxInner>) -> Self {
        Self {
            id,
            mux,
            queue: FrameQueue::new(),
            noti: Signal::new(),
            err: ErrorSlot::new(),
            recv_timeout_nanos: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// The id of this session. Non-zero, unique within the owning mux.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True once [`close`](Session::close) has run or the owning mux
    /// has shut down.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Write raw bytes to the shared transport.
    ///
    /// The mux performs no framing on outbound data: the caller builds
    /// complete frames whose header embeds this session's id. Each call
    /// is written atomically with respect to other sessions (one writer
    /// lock guards the transport), so a complete frame per call is never
    /// interleaved with another session's output.
    ///
    /// There is no send timeout.
    pub fn send(&self, buf: &[u8]) -> Result<usize> {
        if self.is_closed() {
            return Err(MuxError::SessionClosed);
        }
        let Some(mux) = self.mux.upgrade() else {
            return Err(MuxError::SessionClosed);
        };
        mux.write(buf)?;
        Ok(buf.len())
    }

    /// Receive the next frame routed to this session.
    ///
    /// Returns the oldest queued frame immediately if one is pending.
    /// Otherwise suspends until a frame arrives, the session's terminal
    /// error is raised, or the configured receive timeout elapses.
    /// Frames queued before a shutdown are still drained before the
    /// terminal error is reported.
    pub fn receive(&self) -> Result<Frame> {
        let deadline = self
            .recv_timeout()
            .map(|timeout| (timeout, Instant::now() + timeout));
        let data_rx = self.noti.receiver();
        let err_rx = self.err.receiver();

        loop {
            if let Some(frame) = self.queue.pop() {
                return Ok(frame);
            }
            if let Some(err) = self.err.get() {
                return Err(err);
            }
            if self.is_closed() {
                return Err(MuxError::SessionClosed);
            }

            // The data signal is coalesced, so every wake-up loops back
            // to re-check the queue rather than trusting the signal.
            match deadline {
                None => {
                    select! {
                        recv(data_rx) -> _ => {}
                        recv(err_rx) -> _ => {}
                    }
                }
                Some((timeout, deadline)) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    select! {
                        recv(data_rx) -> _ => {}
                        recv(err_rx) -> _ => {}
                        default(remaining) => {
                            // A frame may have been enqueued between the
                            // last check and the timer firing; the timer
                            // loses that race.
                            if let Some(frame) = self.queue.pop() {
                                return Ok(frame);
                            }
                            if let Some(err) = self.err.get() {
                                return Err(err);
                            }
                            return Err(MuxError::ReceiveTimeout(timeout));
                        }
                    }
                }
            }
        }
    }

    /// Set the timeout applied to each subsequent [`receive`] call.
    ///
    /// A zero duration disables the timeout, making `receive` wait
    /// indefinitely for a frame or a terminal error.
    ///
    /// [`receive`]: Session::receive
    pub fn set_receive_timeout(&self, timeout: Duration) {
        let nanos = u64::try_from(timeout.as_nanos()).unwrap_or(u64::MAX);
        self.recv_timeout_nanos.store(nanos, Ordering::Relaxed);
    }

    fn recv_timeout(&self) -> Option<Duration> {
        match self.recv_timeout_nanos.load(Ordering::Relaxed) {
            0 => None,
            nanos => Some(Duration::from_nanos(nanos)),
        }
    }

    /// Close this session. Idempotent.
    ///
    /// Detaches the session from the mux registry, so further inbound
    /// frames carrying its id go to the default handler (or are
    /// dropped). Queued frames remain receivable; once drained,
    /// `receive` reports the session closed. `send` fails immediately.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(mux) = self.mux.upgrade() {
            mux.close_session(self.id);
        }
        // Wake a receiver blocked on the data signal so it observes the
        // close instead of waiting out its timeout.
        self.noti.notify();
        debug!(session_id = self.id, "session closed");
    }

    /// Flip the closed flag without touching the registry. Used by the
    /// mux shutdown path, which already holds the registry lock.
    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}
