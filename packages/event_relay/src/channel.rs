use std::collections::HashMap;
use std::fmt;
use std::io;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, trace};

use crate::pal::PlatformPipe;
use crate::{Error, InputRegistry, Result, WaitHandle};

/// Largest payload a single frame can carry. Longer payloads are truncated to this length.
pub const MAX_PAYLOAD: usize = 8192;

/// Operation code carried by a frame and passed to the handler.
pub type OpCode = u32;

const HEADER_LEN: usize = 16;

// How long a reader waits for the rest of a frame whose header has already arrived. Writers
// hold the writer lock across both writes, so the payload follows almost immediately.
const PAYLOAD_GRACE: Duration = Duration::from_secs(5);

type Handler = Arc<dyn Fn(OpCode, Option<&[u8]>) + Send + Sync>;

/// Identifies a handler registered on a [`MessageChannel`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct HandlerId(u64);

impl HandlerId {
    /// The raw value carried in frame headers.
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Delivers small messages from any thread to handlers running on the thread of a foreign
/// readiness-polling event loop.
///
/// A frame is written into a pipe as a 16-byte header (handler, operation code, payload length)
/// followed by the payload. The event loop watches [`wait_handle()`][Self::wait_handle] and calls
/// [`on_readable()`][Self::on_readable] when it fires, which reads one frame and invokes the
/// handler it names on the loop thread. [`attach()`][Self::attach] wires this up for any
/// [`InputRegistry`].
///
/// Clones share the same pipe. [`teardown()`][Self::teardown] closes the channel for every
/// clone: later posts and reads fail with [`Error::ChannelClosed`]. The pipe itself is released
/// when the last clone is gone.
///
/// If a frame is ever only partially written or read, the channel is broken for good: every
/// later post or read fails with [`Error::ChannelBroken`].
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use event_relay::MessageChannel;
///
/// let channel = MessageChannel::new()?;
/// let received = Arc::new(Mutex::new(Vec::new()));
///
/// let sink = Arc::clone(&received);
/// let handler = channel.register(move |op, payload| {
///     sink.lock().unwrap().push((op, payload.map(<[u8]>::to_vec)));
/// });
///
/// channel.post(handler, 7, Some(b"hello"))?;
/// channel.post(handler, 3, None)?;
///
/// assert_eq!(channel.drain()?, 2);
/// assert_eq!(
///     *received.lock().unwrap(),
///     vec![(7, Some(b"hello".to_vec())), (3, None)]
/// );
/// # Ok::<(), event_relay::Error>(())
/// ```
#[derive(Clone)]
pub struct MessageChannel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    pipe: PlatformPipe,

    // Held across the header and payload of one frame so frames are never interleaved.
    writer: Mutex<()>,
    reader: Mutex<()>,

    handlers: Mutex<HashMap<HandlerId, Handler>>,
    next_handler: AtomicU64,

    broken: AtomicBool,
    closed: AtomicBool,

    registry: Mutex<Option<Arc<dyn InputRegistry>>>,
}

impl MessageChannel {
    /// Creates a channel with a fresh pipe.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`] if the pipe (or, on Windows, the frame semaphore)
    /// cannot be created.
    pub fn new() -> Result<Self> {
        Self::from_pipe(PlatformPipe::new())
    }

    pub(crate) fn from_pipe(pipe: io::Result<PlatformPipe>) -> Result<Self> {
        let pipe = pipe.map_err(Error::resource("message channel pipe"))?;

        debug!(handle = ?pipe.wait_handle(), "created message channel");

        Ok(Self {
            inner: Arc::new(ChannelInner {
                pipe,
                writer: Mutex::new(()),
                reader: Mutex::new(()),
                handlers: Mutex::new(HashMap::new()),
                next_handler: AtomicU64::new(1),
                broken: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                registry: Mutex::new(None),
            }),
        })
    }

    /// Registers a handler invoked on the event loop thread for every frame addressed to it.
    ///
    /// The handler receives the operation code and the payload, or `None` for an empty payload.
    /// It runs without any channel lock held, so it may post to this channel itself.
    pub fn register<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(OpCode, Option<&[u8]>) + Send + Sync + 'static,
    {
        let id = HandlerId(self.inner.next_handler.fetch_add(1, Ordering::Relaxed));

        self.inner.handlers.lock().insert(id, Arc::new(handler));

        id
    }

    /// Removes a handler. Frames still in flight for it are consumed and dropped.
    ///
    /// Returns whether the handler was registered.
    pub fn unregister(&self, id: HandlerId) -> bool {
        self.inner.handlers.lock().remove(&id).is_some()
    }

    /// Writes one frame addressed to `handler`.
    ///
    /// Payloads longer than [`MAX_PAYLOAD`] bytes are truncated. `None` and an empty slice are
    /// both delivered as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtocolViolation`] if only part of the frame could be written or the
    /// frame could not be announced to the event loop, which breaks the channel.
    /// Returns [`Error::ChannelBroken`] if the channel is already broken,
    /// [`Error::ChannelClosed`] if it has been torn down and [`Error::Io`] if the write fails
    /// outright.
    pub fn post(&self, handler: HandlerId, op: OpCode, payload: Option<&[u8]>) -> Result<()> {
        self.ensure_intact()?;

        let payload = payload.unwrap_or_default();
        let payload = payload.get(..MAX_PAYLOAD).unwrap_or(payload);

        let header = encode_header(handler, op, payload.len());

        let _writer = self.inner.writer.lock();

        // Checked under the writer lock, so no frame starts after teardown has returned.
        if self.is_closed() {
            return Err(Error::ChannelClosed);
        }

        self.write_exactly(&header, "header")?;

        if !payload.is_empty() {
            self.write_exactly(payload, "payload")?;
        }

        // A frame that is in the pipe but never announced would desynchronize the reader.
        self.inner.pipe.frame_posted().map_err(|error| {
            self.violation(format!("frame written but not announced: {error}"))
        })?;

        trace!(handler = handler.0, op, len = payload.len(), "posted frame");

        Ok(())
    }

    /// Reads one pending frame and invokes its handler. Must be called from the event loop
    /// thread when the [`wait_handle()`][Self::wait_handle] reports readiness.
    ///
    /// Returns `Ok(false)` if no frame was pending, which happens on spurious wake-ups.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtocolViolation`] if a partial or malformed frame is read, which breaks
    /// the channel, [`Error::ChannelBroken`] if the channel is already broken,
    /// [`Error::ChannelClosed`] if it has been torn down and [`Error::Io`] if reading fails.
    pub fn on_readable(&self) -> Result<bool> {
        self.read_frame(false)
    }

    fn read_frame(&self, consume_announcement: bool) -> Result<bool> {
        self.ensure_intact()?;

        let reader = self.inner.reader.lock();

        let mut header = [0_u8; HEADER_LEN];

        let received = match self.inner.pipe.read(&mut header) {
            Ok(received) => received,
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => return Ok(false),
            Err(error) => return Err(error.into()),
        };

        if received == 0 {
            return Err(self.violation("the write end of the pipe is gone"));
        }

        if received < HEADER_LEN {
            return Err(self.violation(format!(
                "read {received} of {HEADER_LEN} header bytes"
            )));
        }

        let (handler, op, len) = decode_header(&header);

        if len > MAX_PAYLOAD {
            return Err(self.violation(format!(
                "frame declares {len} payload bytes, more than the maximum of {MAX_PAYLOAD}"
            )));
        }

        let mut scratch = [0_u8; MAX_PAYLOAD];
        let payload = scratch
            .get_mut(..len)
            .ok_or_else(|| self.violation("payload length out of range"))?;

        self.read_exactly(payload)?;

        if consume_announcement {
            self.inner.pipe.frame_consumed();
        }

        drop(reader);

        // Clone the handler out so that it runs with no channel lock held.
        let target = self.inner.handlers.lock().get(&handler).cloned();

        match target {
            Some(target) => {
                trace!(handler = handler.0, op, len, "dispatching frame");
                target(op, (len > 0).then_some(&*payload));
            }
            None => {
                debug!(
                    handler = handler.0,
                    op, len, "dropped frame for unregistered handler"
                );
            }
        }

        Ok(true)
    }

    /// Dispatches every pending frame on the calling thread, returning how many were processed.
    ///
    /// Unlike [`on_readable()`][Self::on_readable], this is not preceded by a wait on the
    /// [`wait_handle()`][Self::wait_handle], so it also consumes the readiness of every frame it
    /// reads. An event loop waiting on the handle afterwards is not woken for these frames.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by [`on_readable()`][Self::on_readable].
    pub fn drain(&self) -> Result<usize> {
        let mut dispatched: usize = 0;

        while self.read_frame(true)? {
            dispatched = dispatched.saturating_add(1);
        }

        Ok(dispatched)
    }

    /// The handle an event loop waits on. It becomes readable (on Windows: signaled once per
    /// frame) whenever a frame is pending.
    #[must_use]
    pub fn wait_handle(&self) -> WaitHandle {
        self.inner.pipe.wait_handle()
    }

    /// Whether an earlier protocol violation has broken the channel.
    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.inner.broken.load(Ordering::Acquire)
    }

    /// Whether any handle of the channel has been torn down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Registers the channel with a foreign event loop, which then calls
    /// [`on_readable()`][Self::on_readable] on its own thread whenever a frame is pending.
    ///
    /// Failures while dispatching are logged, as there is no caller to return them to.
    /// A channel can be attached to one registry at a time; attaching again first detaches
    /// from the previous one.
    pub fn attach<R>(&self, registry: Arc<R>)
    where
        R: InputRegistry + 'static,
    {
        let registry: Arc<dyn InputRegistry> = registry;

        self.detach();

        let channel = Arc::downgrade(&self.inner);
        let handle = self.wait_handle();

        registry.add_input(
            handle,
            Arc::new(move || {
                dispatch_from_loop(&channel);
            }),
        );

        debug!(handle = ?handle, "attached message channel to event loop");

        *self.inner.registry.lock() = Some(registry);
    }

    /// Removes the channel from the event loop it was attached to, if any.
    ///
    /// Returns whether the channel was attached.
    pub fn detach(&self) -> bool {
        let Some(registry) = self.inner.registry.lock().take() else {
            return false;
        };

        let handle = self.wait_handle();
        registry.remove_input(handle);

        debug!(handle = ?handle, "detached message channel from event loop");
        true
    }

    /// Closes the channel for every handle, detaches it from its event loop, drops every
    /// registered handler and gives up this handle.
    ///
    /// Posts and reads through any remaining clone fail with [`Error::ChannelClosed`] from now
    /// on, so producers never write into a pipe that nobody reads. Frames still in the pipe are
    /// discarded unread. The pipe itself is released once every clone is gone.
    pub fn teardown(self) {
        self.inner.closed.store(true, Ordering::Release);

        self.detach();

        let handlers = mem::take(&mut *self.inner.handlers.lock());
        let dropped = handlers.len();
        drop(handlers);

        debug!(handlers = dropped, "tore down message channel");
    }

    fn ensure_intact(&self) -> Result<()> {
        if self.is_closed() {
            Err(Error::ChannelClosed)
        } else if self.is_broken() {
            Err(Error::ChannelBroken)
        } else {
            Ok(())
        }
    }

    fn violation(&self, problem: impl Into<String>) -> Error {
        let error = Error::protocol(problem);

        self.inner.broken.store(true, Ordering::Release);
        error!(%error, "message channel is broken");

        error
    }

    fn write_exactly(&self, bytes: &[u8], part: &str) -> Result<()> {
        let written = self.inner.pipe.write(bytes)?;

        if written == bytes.len() {
            Ok(())
        } else {
            Err(self.violation(format!(
                "wrote {written} of {} {part} bytes",
                bytes.len()
            )))
        }
    }

    fn read_exactly(&self, buf: &mut [u8]) -> Result<()> {
        let wanted = buf.len();
        let mut filled: usize = 0;

        while let Some(rest) = buf.get_mut(filled..).filter(|rest| !rest.is_empty()) {
            match self.inner.pipe.read(rest) {
                Ok(0) => {
                    return Err(self.violation(format!(
                        "pipe ended after {filled} of {wanted} payload bytes"
                    )));
                }
                Ok(received) => filled = filled.saturating_add(received),
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                    if !self.inner.pipe.wait_readable(Some(PAYLOAD_GRACE))? {
                        return Err(self.violation(format!(
                            "timed out after {filled} of {wanted} payload bytes"
                        )));
                    }
                }
                Err(error) => return Err(error.into()),
            }
        }

        Ok(())
    }
}

fn dispatch_from_loop(channel: &Weak<ChannelInner>) {
    let Some(inner) = channel.upgrade() else {
        return;
    };

    let channel = MessageChannel { inner };

    if let Err(error) = channel.on_readable() {
        error!(%error, "failed to dispatch message channel frame");
    }
}

fn encode_header(handler: HandlerId, op: OpCode, len: usize) -> [u8; HEADER_LEN] {
    // The payload has already been clamped to MAX_PAYLOAD, which fits in u32.
    let len = u32::try_from(len).unwrap_or(u32::MAX);

    let mut header = [0_u8; HEADER_LEN];
    let (handler_bytes, rest) = header.split_at_mut(8);
    let (op_bytes, len_bytes) = rest.split_at_mut(4);

    handler_bytes.copy_from_slice(&handler.0.to_ne_bytes());
    op_bytes.copy_from_slice(&op.to_ne_bytes());
    len_bytes.copy_from_slice(&len.to_ne_bytes());

    header
}

fn decode_header(header: &[u8; HEADER_LEN]) -> (HandlerId, OpCode, usize) {
    let (handler_bytes, rest) = header.split_at(8);
    let (op_bytes, len_bytes) = rest.split_at(4);

    let handler = u64::from_ne_bytes(handler_bytes.try_into().unwrap_or_default());
    let op = u32::from_ne_bytes(op_bytes.try_into().unwrap_or_default());
    let len = u32::from_ne_bytes(len_bytes.try_into().unwrap_or_default());

    (
        HandlerId(handler),
        op,
        usize::try_from(len).unwrap_or(usize::MAX),
    )
}

impl fmt::Debug for MessageChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageChannel")
            .field("pipe", &self.inner.pipe)
            .field("handlers", &self.inner.handlers.lock().len())
            .field("broken", &self.is_broken())
            .field("closed", &self.is_closed())
            .field("attached", &self.inner.registry.lock().is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for ChannelInner {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.get_mut().take() {
            registry.remove_input(self.pipe.wait_handle());
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;
    use std::sync::Mutex as StdMutex;

    use static_assertions::assert_impl_all;
    use testing::DropTracker;

    use super::*;
    use crate::Reactor;

    assert_impl_all!(MessageChannel: Send, Sync, Clone, Debug);
    assert_impl_all!(HandlerId: Send, Sync, Copy, Debug);

    type Received = Arc<StdMutex<Vec<(OpCode, Option<Vec<u8>>)>>>;

    fn recording_handler(channel: &MessageChannel) -> (HandlerId, Received) {
        let received: Received = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&received);

        let id = channel.register(move |op, payload| {
            sink.lock().unwrap().push((op, payload.map(<[u8]>::to_vec)));
        });

        (id, received)
    }

    #[test]
    fn header_layout_is_handler_op_len() {
        let header = encode_header(HandlerId(0x0102_0304_0506_0708), 7, 5);

        assert_eq!(header.get(..8), Some(&0x0102_0304_0506_0708_u64.to_ne_bytes()[..]));
        assert_eq!(header.get(8..12), Some(&7_u32.to_ne_bytes()[..]));
        assert_eq!(header.get(12..), Some(&5_u32.to_ne_bytes()[..]));

        assert_eq!(
            decode_header(&header),
            (HandlerId(0x0102_0304_0506_0708), 7, 5)
        );
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call FFI functions")]
    fn spurious_readiness_is_not_an_error() {
        let channel = MessageChannel::new().unwrap();

        assert!(!channel.on_readable().unwrap());
        assert_eq!(channel.drain().unwrap(), 0);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call FFI functions")]
    fn empty_payload_is_delivered_as_none() {
        let channel = MessageChannel::new().unwrap();
        let (id, received) = recording_handler(&channel);

        channel.post(id, 3, Some(&[])).unwrap();
        channel.post(id, 4, None).unwrap();

        assert_eq!(channel.drain().unwrap(), 2);
        assert_eq!(*received.lock().unwrap(), vec![(3, None), (4, None)]);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call FFI functions")]
    fn frames_for_unregistered_handlers_are_dropped() {
        let channel = MessageChannel::new().unwrap();
        let (id, received) = recording_handler(&channel);

        channel.post(id, 1, Some(b"late")).unwrap();
        assert!(channel.unregister(id));
        assert!(!channel.unregister(id));

        assert!(channel.on_readable().unwrap());
        assert!(received.lock().unwrap().is_empty());
        assert!(!channel.is_broken());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call FFI functions")]
    fn handler_may_post_to_its_own_channel() {
        let channel = MessageChannel::new().unwrap();
        let (echo_target, received) = recording_handler(&channel);

        let echo_channel = channel.clone();
        let echo = channel.register(move |op, payload| {
            echo_channel.post(echo_target, op + 100, payload).unwrap();
        });

        channel.post(echo, 1, Some(b"ping")).unwrap();

        assert_eq!(channel.drain().unwrap(), 2);
        assert_eq!(
            *received.lock().unwrap(),
            vec![(101, Some(b"ping".to_vec()))]
        );
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call FFI functions")]
    fn attached_reactor_dispatches_frames() {
        let reactor = Arc::new(Reactor::new());
        let channel = MessageChannel::new().unwrap();
        channel.attach(Arc::clone(&reactor));

        let (id, received) = recording_handler(&channel);
        channel.post(id, 7, Some(b"hello")).unwrap();

        assert_eq!(reactor.run_pending().unwrap(), 1);
        assert_eq!(
            *received.lock().unwrap(),
            vec![(7, Some(b"hello".to_vec()))]
        );
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call FFI functions")]
    fn drain_leaves_no_readiness_behind() {
        let reactor = Arc::new(Reactor::new());
        let channel = MessageChannel::new().unwrap();
        channel.attach(Arc::clone(&reactor));

        let (id, received) = recording_handler(&channel);
        channel.post(id, 1, None).unwrap();
        channel.post(id, 2, None).unwrap();

        assert_eq!(channel.drain().unwrap(), 2);
        assert_eq!(reactor.run_once(Some(Duration::ZERO)).unwrap(), 0);
        assert_eq!(received.lock().unwrap().len(), 2);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call FFI functions")]
    fn teardown_closes_every_handle() {
        let tracker = DropTracker::new();
        let reactor = Arc::new(Reactor::new());
        let channel = MessageChannel::new().unwrap();
        channel.attach(Arc::clone(&reactor));

        let token = tracker.token();
        let id = channel.register(move |_op, _payload| {
            let _held = &token;
        });

        let producer = channel.clone();
        assert!(!producer.is_closed());

        channel.teardown();

        assert!(producer.is_closed());
        assert_eq!(reactor.input_count(), 0);
        assert_eq!(tracker.dropped(), 1);

        assert!(matches!(
            producer.post(id, 1, Some(b"late")).unwrap_err(),
            Error::ChannelClosed
        ));
        assert!(matches!(
            producer.on_readable().unwrap_err(),
            Error::ChannelClosed
        ));
        assert!(!producer.is_broken());
    }

    #[cfg(unix)]
    mod mocked {
        use mockall::predicate::{always, eq};

        use super::*;
        use crate::MockInputRegistry;
        use crate::pal::{BindingsFacade, MockBindings};

        fn mock_channel(configure: impl FnOnce(&mut MockBindings)) -> MessageChannel {
            let mut bindings = MockBindings::new();

            bindings.expect_pipe().returning(|| Ok([30, 31]));
            bindings
                .expect_set_nonblocking()
                .with(eq(30))
                .returning(|_| Ok(()));
            bindings.expect_close().times(2).return_const(());

            configure(&mut bindings);

            MessageChannel::from_pipe(PlatformPipe::with_bindings(BindingsFacade::from_mock(
                bindings,
            )))
            .unwrap()
        }

        #[test]
        fn short_header_write_breaks_the_channel() {
            let channel = mock_channel(|bindings| {
                bindings
                    .expect_write()
                    .with(eq(31), always())
                    .times(1)
                    .returning(|_, _| Ok(5));
            });

            let error = channel.post(HandlerId(1), 7, Some(b"hello")).unwrap_err();
            assert!(matches!(error, Error::ProtocolViolation { .. }));
            assert!(channel.is_broken());

            assert!(matches!(
                channel.post(HandlerId(1), 7, None).unwrap_err(),
                Error::ChannelBroken
            ));
            assert!(matches!(
                channel.on_readable().unwrap_err(),
                Error::ChannelBroken
            ));
        }

        #[test]
        fn partial_header_read_breaks_the_channel() {
            let channel = mock_channel(|bindings| {
                bindings.expect_read().times(1).returning(|_, _| Ok(3));
            });

            assert!(matches!(
                channel.on_readable().unwrap_err(),
                Error::ProtocolViolation { .. }
            ));
            assert!(channel.is_broken());
        }

        #[test]
        fn oversized_declared_length_breaks_the_channel() {
            let channel = mock_channel(|bindings| {
                bindings.expect_read().times(1).returning(|_, buf| {
                    let header = encode_header(HandlerId(1), 2, MAX_PAYLOAD + 1);
                    buf.copy_from_slice(&header);
                    Ok(HEADER_LEN)
                });
            });

            assert!(matches!(
                channel.on_readable().unwrap_err(),
                Error::ProtocolViolation { .. }
            ));
        }

        #[test]
        #[cfg_attr(miri, ignore = "Miri cannot call FFI functions")]
        fn attach_registers_and_teardown_detaches() {
            let channel = MessageChannel::new().unwrap();
            let handle = channel.wait_handle();

            let mut registry = MockInputRegistry::new();
            registry
                .expect_add_input()
                .withf(move |added, _| *added == handle)
                .times(1)
                .return_const(());
            registry
                .expect_remove_input()
                .with(eq(handle))
                .times(1)
                .return_const(true);

            channel.attach(Arc::new(registry));
            channel.teardown();
        }

        #[test]
        fn creation_failure_is_resource_exhaustion() {
            let mut bindings = MockBindings::new();
            bindings
                .expect_pipe()
                .returning(|| Err(io::Error::from_raw_os_error(libc::EMFILE)));

            let error = MessageChannel::from_pipe(PlatformPipe::with_bindings(
                BindingsFacade::from_mock(bindings),
            ))
            .unwrap_err();

            assert!(matches!(
                error,
                Error::ResourceExhausted {
                    resource: "message channel pipe",
                    ..
                }
            ));
        }
    }
}
