use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{EventKind, Payload, StreamId};

/// A typed, reference-counted notification traveling through a queue.
///
/// An `Event` is a handle. A freshly created event has exactly one handle; [`add_ref()`][1]
/// creates another handle to the same event, for example to fan the same error out to two
/// consumers. [`release()`][2] (or simply dropping the handle) gives one handle up. When the last
/// handle is gone, the payload is dropped on whichever thread released it.
///
/// An event can be on at most one queue at a time, no matter how many handles exist. Posting an
/// event that is already queued is a contract violation and panics.
///
/// # Example
///
/// ```rust
/// use event_relay::{Event, EventKind, Payload};
///
/// let error = Event::with_payload(
///     EventKind::ERROR,
///     0,
///     Payload::Error("output device vanished".to_string()),
/// );
///
/// let for_ui = error.add_ref();
/// assert_eq!(error.ref_count(), 2);
///
/// assert!(!error.release());
/// assert!(for_ui.release());
/// ```
///
/// [1]: Event::add_ref
/// [2]: Event::release
pub struct Event {
    inner: Arc<EventInner>,
}

struct EventInner {
    kind: EventKind,
    stream_id: StreamId,
    payload: Payload,

    // Shared by all handles so that two handles to one event cannot sit on two queues.
    queued: AtomicBool,
}

impl Event {
    /// Creates an event without a payload.
    #[must_use]
    pub fn new(kind: EventKind, stream_id: StreamId) -> Self {
        Self::with_payload(kind, stream_id, Payload::None)
    }

    /// Creates an event carrying the given payload.
    #[must_use]
    pub fn with_payload(kind: EventKind, stream_id: StreamId, payload: Payload) -> Self {
        Self {
            inner: Arc::new(EventInner {
                kind,
                stream_id,
                payload,
                queued: AtomicBool::new(false),
            }),
        }
    }

    /// The kind of the event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.inner.kind
    }

    /// The stream the event belongs to.
    #[must_use]
    pub fn stream_id(&self) -> StreamId {
        self.inner.stream_id
    }

    /// The payload of the event.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.inner.payload
    }

    /// Whether this is a control event that must preempt ordinary processing.
    #[must_use]
    pub fn is_control(&self) -> bool {
        self.inner.kind.is_control()
    }

    /// Creates another handle to the same event, incrementing the reference count.
    #[must_use]
    pub fn add_ref(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Gives up this handle, decrementing the reference count.
    ///
    /// Returns `true` if this was the last handle, in which case the event and its payload have
    /// been torn down before this method returns.
    pub fn release(self) -> bool {
        Arc::into_inner(self.inner).is_some()
    }

    /// The number of handles that currently exist for this event.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether some queue currently holds this event.
    #[must_use]
    pub fn is_queued(&self) -> bool {
        self.inner.queued.load(Ordering::Acquire)
    }

    /// Marks the event as held by a queue.
    ///
    /// # Panics
    ///
    /// Panics if the event is already held by a queue.
    pub(crate) fn mark_queued(&self) {
        let was_queued = self.inner.queued.swap(true, Ordering::AcqRel);

        assert!(
            !was_queued,
            "{:?} is already on a queue; an event can be on at most one queue at a time",
            self.inner.kind
        );
    }

    pub(crate) fn mark_dequeued(&self) {
        self.inner.queued.store(false, Ordering::Release);
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.inner.kind)
            .field("stream_id", &self.inner.stream_id)
            .field("payload", &self.inner.payload)
            .field("ref_count", &self.ref_count())
            .finish_non_exhaustive()
    }
}
