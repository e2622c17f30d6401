use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::{Event, EventKind, Notify, Placement, PopIf, QueueCore, Result, Signal, WaitHandle};

/// A queue of [`Event`]s with one consumer, waking that consumer through `N`.
///
/// Producers on any thread call [`post()`][Queue::post]. The single consumer takes events out
/// with [`pop()`][Queue::pop] and the other dequeue operations. The type of `N` decides how the
/// consumer is woken:
///
/// * [`ThreadQueue`] wakes a dedicated worker thread through a [`Signal`] and adds blocking
///   [`wait()`][Queue::wait] helpers.
/// * [`AppQueue`][crate::AppQueue] wakes a foreign event loop through a
///   [`MessageChannel`][crate::MessageChannel].
///
/// Dropping the queue releases every event still queued.
#[derive(Debug)]
pub struct Queue<N: Notify> {
    core: Arc<QueueCore>,
    notify: N,
    name: String,
}

/// A queue consumed by a dedicated worker thread that blocks on a [`Signal`] while idle.
///
/// # Example
///
/// ```rust
/// use std::thread;
///
/// use event_relay::{Event, EventKind, Placement, ThreadQueue};
///
/// let queue = ThreadQueue::builder().name("decoder").build()?;
///
/// thread::scope(|s| {
///     s.spawn(|| {
///         for _ in 0..3 {
///             queue
///                 .post(Event::new(EventKind::BUFFER, 1), Placement::Back)
///                 .unwrap();
///         }
///         queue.post(Event::new(EventKind::END, 1), Placement::Back).unwrap();
///     });
///
///     let mut buffers = 0;
///     while queue.wait()?.kind() == EventKind::BUFFER {
///         buffers += 1;
///     }
///     assert_eq!(buffers, 3);
///     Ok::<(), event_relay::Error>(())
/// })?;
/// # Ok::<(), event_relay::Error>(())
/// ```
pub type ThreadQueue = Queue<Signal>;

impl<N: Notify> Queue<N> {
    pub(crate) fn from_parts(core: Arc<QueueCore>, notify: N, name: String) -> Self {
        debug!(queue = %name, "created queue");

        Self { core, notify, name }
    }

    /// Enqueues `event` according to `placement` and wakes the consumer if needed.
    ///
    /// Events discarded by [`Placement::Flush`] are released before this returns, outside the
    /// queue lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the consumer could not be woken. The event is queued regardless.
    ///
    /// # Panics
    ///
    /// Panics if the event (through any of its handles) is already on a queue.
    pub fn post(&self, event: Event, placement: Placement) -> Result<()> {
        let kind = event.kind();
        let transition = self.core.enqueue(event, placement);

        trace!(queue = %self.name, ?kind, ?placement, ?transition, "posted event");

        self.notify.notify(transition)
    }

    /// Removes and returns the head, or `None` if the queue is empty.
    ///
    /// Resets the wake-up state once the queue is empty.
    #[must_use]
    pub fn pop(&self) -> Option<Event> {
        let mut chain = self.core.lock();
        let head = chain.take_front();

        if chain.is_empty() {
            self.notify.reset();
        }

        drop(chain);

        let event = head.into_first();

        if let Some(event) = &event {
            trace!(queue = %self.name, kind = ?event.kind(), "popped event");
        }

        event
    }

    /// Removes and returns the head only if its kind is `expected`.
    ///
    /// A head of any other kind stays queued and is reported as [`PopIf::Mismatched`].
    #[must_use]
    pub fn pop_if(&self, expected: EventKind) -> PopIf {
        let mut chain = self.core.lock();
        let head_kind = chain.head_kind();
        let head = chain.take_front_if(|kind| kind == expected);

        if chain.is_empty() {
            self.notify.reset();
        }

        drop(chain);

        head.into_pop_if(head_kind)
    }

    /// Removes and returns the head only if its kind is neither `kind_a` nor `kind_b`.
    ///
    /// A consumer in the middle of a long operation uses this to pick up everything except
    /// the events it is currently not prepared to handle.
    #[must_use]
    pub fn pop_unless(&self, kind_a: EventKind, kind_b: EventKind) -> Option<Event> {
        let mut chain = self.core.lock();
        let head = chain.take_front_if(|kind| kind != kind_a && kind != kind_b);

        if chain.is_empty() {
            self.notify.reset();
        }

        drop(chain);

        head.into_first()
    }

    /// The kind of the head without removing it, or `None` if the queue is empty.
    #[must_use]
    pub fn peek_kind(&self) -> Option<EventKind> {
        self.core.peek_kind()
    }

    /// Whether a control event is waiting at the head of the queue.
    ///
    /// A consumer calls this periodically during long operations to find out whether it has to
    /// abandon them. If no control event is at the head, the wake-up state is reset so that
    /// the consumer is only woken again by new posts.
    #[must_use]
    pub fn check_preempt(&self) -> bool {
        let chain = self.core.lock();

        if chain.head_kind().is_some_and(EventKind::is_control) {
            true
        } else {
            self.notify.reset();
            false
        }
    }

    /// Discards every queued event, returning how many were released.
    pub fn flush(&self) -> usize {
        let mut chain = self.core.lock();
        let detached = chain.take_all();
        self.notify.reset();
        drop(chain);

        let released = detached.release();

        if released > 0 {
            debug!(queue = %self.name, released, "flushed queue");
        }

        released
    }

    /// The number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.core.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.core.is_empty()
    }

    /// The name used for this queue in log output.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The mechanism used to wake the consumer.
    #[must_use]
    pub fn notifier(&self) -> &N {
        &self.notify
    }

    /// Releases every queued event and then the wake mechanism itself.
    ///
    /// Dropping the queue has the same effect. This method exists for call sites that want to
    /// make the end of the queue's life explicit.
    pub fn teardown(self) {
        let released = self.flush();
        debug!(queue = %self.name, released, "tore down queue");
    }
}

impl Queue<Signal> {
    /// Creates a thread queue with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`][crate::Error::ResourceExhausted] if the wake
    /// signal cannot be created.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Starts building a queue.
    pub fn builder() -> QueueBuilder {
        QueueBuilder::new()
    }

    /// Removes and returns the head, blocking until an event arrives if the queue is empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`][crate::Error::Io] if waiting on the signal fails.
    pub fn wait(&self) -> Result<Event> {
        loop {
            if let Some(event) = self.pop() {
                return Ok(event);
            }

            self.notify.wait()?;
        }
    }

    /// Removes and returns the head, blocking for at most `timeout` if the queue is empty.
    ///
    /// Returns `None` if nothing arrived in time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`][crate::Error::Io] if waiting on the signal fails.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<Option<Event>> {
        let deadline = Instant::now().checked_add(timeout);

        loop {
            if let Some(event) = self.pop() {
                return Ok(Some(event));
            }

            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => timeout,
            };

            if remaining.is_zero() || !self.notify.wait_timeout(remaining)? {
                return Ok(self.pop());
            }
        }
    }

    /// Blocks until the queue is non-empty, then removes and returns the head if its kind is
    /// `expected`.
    ///
    /// Returns `None` without removing anything if the head has a different kind, for example
    /// because a control event was posted to the front while the consumer was waiting for data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`][crate::Error::Io] if waiting on the signal fails.
    pub fn wait_for(&self, expected: EventKind) -> Result<Option<Event>> {
        loop {
            match self.pop_if(expected) {
                PopIf::Popped(event) => return Ok(Some(event)),
                PopIf::Mismatched(_) => return Ok(None),
                PopIf::Empty => self.notify.wait()?,
            }
        }
    }

    /// The handle of the underlying [`Signal`], for waiting on the queue from a polling loop.
    ///
    /// The handle is readable whenever the consumer has been woken and has not yet drained
    /// the queue.
    #[must_use]
    pub fn wait_handle(&self) -> WaitHandle {
        self.notify.wait_handle()
    }
}

static NEXT_QUEUE_NUMBER: AtomicUsize = AtomicUsize::new(1);

/// Configures a [`Queue`] before creation.
///
/// Obtain one from [`ThreadQueue::builder()`] or [`QueueBuilder::new()`] and finish with
/// [`build()`][Self::build], [`build_on_channel()`][Self::build_on_channel] or
/// [`build_with()`][Self::build_with].
///
/// # Example
///
/// ```rust
/// use event_relay::{Event, EventKind, Placement, QueueBuilder};
///
/// let queue = QueueBuilder::new().name("output").build()?;
/// assert_eq!(queue.name(), "output");
///
/// queue.post(Event::new(EventKind::CONFIGURE, 0), Placement::Back)?;
/// assert_eq!(queue.len(), 1);
/// # Ok::<(), event_relay::Error>(())
/// ```
#[derive(Debug, Default)]
#[must_use]
pub struct QueueBuilder {
    name: Option<String>,
}

impl QueueBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name used for the queue in log output.
    ///
    /// Queues without an explicit name are numbered in creation order.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds a [`ThreadQueue`] with a fresh [`Signal`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`][crate::Error::ResourceExhausted] if the wake
    /// signal cannot be created.
    pub fn build(self) -> Result<ThreadQueue> {
        let signal = Signal::new()?;
        Ok(self.build_with(signal))
    }

    /// Builds a queue that wakes its consumer through a custom [`Notify`] implementation.
    #[must_use]
    pub fn build_with<N: Notify>(self, notify: N) -> Queue<N> {
        Queue::from_parts(Arc::new(QueueCore::new()), notify, self.into_name())
    }

    pub(crate) fn into_name(self) -> String {
        self.name.unwrap_or_else(|| {
            let number = NEXT_QUEUE_NUMBER.fetch_add(1, Ordering::Relaxed);
            format!("queue-{number}")
        })
    }
}
