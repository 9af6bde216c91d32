use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Bytes, BytesMut};
use crossbeam_channel::select;
use simplemux_frame::{validate_header_size, Frame, FrameError, HeaderParser, MuxHeader, ParseError};
use simplemux_transport::Transport;
use tracing::{debug, trace};

use crate::error::{MuxError, Result};
use crate::queue::FrameQueue;
use crate::session::Session;
use crate::signal::Signal;

/// Handler invoked serially for frames whose session id matches no live
/// session. Must not close the mux it was installed on.
pub type DefaultHandler = Box<dyn FnMut(Frame) + Send>;

/// Configuration accepted by [`Mux::open`].
///
/// `header_size` and a parser are required; the default handler is
/// optional — without one, frames for unknown session ids are dropped.
pub struct MuxConfig {
    /// Fixed size of the protocol header in bytes.
    /// Must be within [`MIN_HEADER_SIZE`]..=[`MAX_HEADER_SIZE`].
    ///
    /// [`MIN_HEADER_SIZE`]: simplemux_frame::MIN_HEADER_SIZE
    /// [`MAX_HEADER_SIZE`]: simplemux_frame::MAX_HEADER_SIZE
    pub header_size: usize,
    /// Parser applied to every inbound header.
    pub parser: Option<HeaderParser>,
    /// Handler for frames without an associated session.
    pub default_handler: Option<DefaultHandler>,
}

impl MuxConfig {
    /// Start a configuration with the given fixed header size.
    pub fn new(header_size: usize) -> Self {
        Self {
            header_size,
            parser: None,
            default_handler: None,
        }
    }

    /// Set the header parser.
    pub fn with_parser<P>(mut self, parser: P) -> Self
    where
        P: Fn(&[u8]) -> std::result::Result<Box<dyn MuxHeader>, ParseError>
            + Send
            + Sync
            + 'static,
    {
        self.parser = Some(Box::new(parser));
        self
    }

    /// Install a handler for frames without an associated session.
    pub fn with_default_handler<H>(mut self, handler: H) -> Self
    where
        H: FnMut(Frame) + Send + 'static,
    {
        self.default_handler = Some(Box::new(handler));
        self
    }
}

impl fmt::Debug for MuxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MuxConfig")
            .field("header_size", &self.header_size)
            .field("parser", &self.parser.is_some())
            .field("default_handler", &self.default_handler.is_some())
            .finish()
    }
}

/// Queue and signals feeding the default-handler worker.
struct DefaultPipeline {
    queue: FrameQueue,
    noti: Signal,
    quit: Signal,
}

struct Registry {
    closed: bool,
    sessions: HashMap<u64, Arc<Session>>,
}

pub(crate) struct MuxInner {
    transport: Box<dyn Transport>,
    header_size: usize,
    parser: HeaderParser,
    /// Serializes transport writes so each `send` call lands as one
    /// contiguous byte run. Never held together with the registry lock.
    writer: Mutex<()>,
    registry: RwLock<Registry>,
    next_id: AtomicU32,
    default_pipeline: Option<DefaultPipeline>,
}

/// A connection multiplexer: one transport, many [`Session`]s.
///
/// Opening a mux takes exclusive ownership of the transport and starts
/// a reader thread that routes inbound frames to sessions by the
/// session id in each frame's header. Dropping the mux closes it and
/// joins its threads.
pub struct Mux {
    inner: Arc<MuxInner>,
    reader: Option<JoinHandle<()>>,
    default_worker: Option<JoinHandle<()>>,
}

impl Mux {
    /// Open a multiplexer over a connected transport.
    ///
    /// Fails without starting any thread if the header size is out of
    /// range or no parser was supplied. The transport must not be used
    /// elsewhere once handed over.
    pub fn open<T: Transport + 'static>(transport: T, config: MuxConfig) -> Result<Self> {
        let MuxConfig {
            header_size,
            parser,
            default_handler,
        } = config;

        validate_header_size(header_size)?;
        let parser = parser.ok_or(FrameError::MissingParser)?;

        let default_pipeline = default_handler.is_some().then(|| DefaultPipeline {
            queue: FrameQueue::new(),
            noti: Signal::new(),
            quit: Signal::new(),
        });

        let inner = Arc::new(MuxInner {
            transport: Box::new(transport),
            header_size,
            parser,
            writer: Mutex::new(()),
            registry: RwLock::new(Registry {
                closed: false,
                sessions: HashMap::new(),
            }),
            next_id: AtomicU32::new(0),
            default_pipeline,
        });

        let default_worker = default_handler.map(|handler| {
            let inner = Arc::clone(&inner);
            thread::spawn(move || default_handler_loop(inner, handler))
        });
        let reader = {
            let inner = Arc::clone(&inner);
            thread::spawn(move || reader_loop(inner))
        };

        debug!(header_size, "mux opened");
        Ok(Self {
            inner,
            reader: Some(reader),
            default_worker,
        })
    }

    /// Create a new session.
    ///
    /// Sessions share the mux's single connection but act like separate
    /// connections. Any number may be open at once. Fails once the mux
    /// is closed.
    pub fn new_session(&self) -> Result<Arc<Session>> {
        let id = self.inner.next_session_id();
        let session = Arc::new(Session::new(id, Arc::downgrade(&self.inner)));

        let mut registry = self.inner.registry.write().unwrap();
        if registry.closed {
            return Err(MuxError::MuxClosed);
        }
        registry.sessions.insert(id, Arc::clone(&session));
        drop(registry);

        debug!(session_id = id, "session created");
        Ok(session)
    }

    /// Close the mux, its transport, and every session. Idempotent.
    ///
    /// Every task suspended in a session `receive` is woken with
    /// [`MuxError::MuxClosed`]; the default worker (if any) is told to
    /// quit once its queue drains.
    pub fn close(&self) {
        self.inner.shutdown(MuxError::MuxClosed);
    }

    /// True once the mux has been closed, by the caller or by a fatal
    /// transport error.
    pub fn is_closed(&self) -> bool {
        self.inner.registry.read().unwrap().closed
    }

    /// Number of currently registered sessions.
    pub fn session_count(&self) -> usize {
        self.inner.registry.read().unwrap().sessions.len()
    }
}

impl fmt::Debug for Mux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mux")
            .field("closed", &self.is_closed())
            .field("sessions", &self.session_count())
            .finish()
    }
}

impl Drop for Mux {
    fn drop(&mut self) {
        self.inner.shutdown(MuxError::MuxClosed);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        if let Some(worker) = self.default_worker.take() {
            let _ = worker.join();
        }
    }
}

impl MuxInner {
    fn is_closed(&self) -> bool {
        self.registry.read().unwrap().closed
    }

    /// Write caller-framed bytes under the transport writer lock.
    pub(crate) fn write(&self, buf: &[u8]) -> Result<()> {
        if self.is_closed() {
            return Err(MuxError::SessionClosed);
        }
        let _writer = self.writer.lock().unwrap();
        self.transport.write_all(buf)?;
        Ok(())
    }

    /// Detach a session from the registry. Idempotent; does not raise
    /// the session's error signal — an explicit close is not an error.
    pub(crate) fn close_session(&self, id: u64) {
        let mut registry = self.registry.write().unwrap();
        if !registry.closed {
            registry.sessions.remove(&id);
        }
    }

    /// Tear the mux down. The first caller wins; the error it carries
    /// is broadcast to every registered session.
    pub(crate) fn shutdown(&self, err: MuxError) {
        let mut registry = self.registry.write().unwrap();
        if registry.closed {
            return;
        }
        registry.closed = true;
        for (_, session) in registry.sessions.drain() {
            session.err.raise(err.clone());
            session.mark_closed();
        }
        if let Some(pipeline) = &self.default_pipeline {
            pipeline.quit.notify();
        }
        let _ = self.transport.shutdown();
        drop(registry);

        debug!(error = %err, "mux shut down");
    }

    /// Allocate a non-zero session id: wall-clock seconds in the high
    /// 32 bits, a wrapping counter that skips zero in the low 32.
    /// Unique within this mux barring a 32-bit wrap inside one second.
    fn next_session_id(&self) -> u64 {
        let mut low = self.next_id.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        while low == 0 {
            low = self.next_id.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        }
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        (secs << 32) | u64::from(low)
    }
}

/// The reader loop: the sole reader of the transport and sole producer
/// of every inbound queue.
fn reader_loop(inner: Arc<MuxInner>) {
    debug!("mux reader started");
    let mut header = BytesMut::zeroed(inner.header_size);

    let err = loop {
        if let Err(err) = inner.transport.read_exact(&mut header) {
            break MuxError::from(err);
        }

        let parsed = match (inner.parser)(&header) {
            Ok(parsed) => parsed,
            Err(err) => break MuxError::Frame(FrameError::Parse(Arc::from(err))),
        };

        let body_len = parsed.body_len();
        if body_len < 0 {
            break MuxError::Frame(FrameError::NegativeBodyLength(body_len));
        }
        let body = if body_len > 0 {
            let mut body = BytesMut::zeroed(body_len as usize);
            if let Err(err) = inner.transport.read_exact(&mut body) {
                break MuxError::from(err);
            }
            body.freeze()
        } else {
            Bytes::new()
        };
        let frame = Frame::new(parsed, body);

        let target = {
            let registry = inner.registry.read().unwrap();
            if registry.closed {
                debug!("mux reader observed close");
                return;
            }
            registry.sessions.get(&frame.session_id()).cloned()
        };

        // The session may be detached between lookup and push; the
        // frame then sits in a queue nobody pops and is released with
        // the session.
        match target {
            Some(session) => {
                trace!(session_id = frame.session_id(), len = frame.body_len(), "frame routed");
                session.queue.push(frame);
                session.noti.notify();
            }
            None => match &inner.default_pipeline {
                Some(pipeline) => {
                    trace!(session_id = frame.session_id(), "frame routed to default handler");
                    pipeline.queue.push(frame);
                    pipeline.noti.notify();
                }
                None => {
                    trace!(session_id = frame.session_id(), "frame for unknown session dropped");
                }
            },
        }
    };

    debug!(error = %err, "mux reader stopped");
    inner.shutdown(err);
}

/// Drains the default queue, invoking the handler one frame at a time
/// so orphan frames keep their arrival order.
fn default_handler_loop(inner: Arc<MuxInner>, mut handler: DefaultHandler) {
    let Some(pipeline) = inner.default_pipeline.as_ref() else {
        return;
    };
    debug!("default handler worker started");
    let noti_rx = pipeline.noti.receiver();
    let quit_rx = pipeline.quit.receiver();
    loop {
        if let Some(frame) = pipeline.queue.pop() {
            handler(frame);
            continue;
        }
        select! {
            recv(noti_rx) -> _ => {}
            recv(quit_rx) -> _ => {
                debug!("default handler worker stopped");
                return;
            }
        }
    }
}
