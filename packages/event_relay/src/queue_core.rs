use std::collections::LinkedList;
use std::mem;

use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::{Event, EventKind};

/// Where a posted event is placed in the queue.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "the three placements are the complete queue insertion vocabulary"
)]
pub enum Placement {
    /// Append behind everything already queued.
    Back,

    /// Insert ahead of everything already queued. Two consecutive front insertions are
    /// observed in reverse order, as each one becomes the new head.
    Front,

    /// Discard everything queued and leave the new event as the only item.
    Flush,
}

/// How an enqueue operation changed the queue, which decides whether the consumer is woken.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "an enqueue either fills an empty queue, grows a non-empty one or replaces it"
)]
pub enum Transition {
    /// The queue was empty before the operation.
    BecameNonEmpty,

    /// The queue already held events, so the consumer is already due to drain it.
    AlreadyNonEmpty,

    /// The previous contents were discarded and replaced by the new event.
    Replaced,
}

impl Transition {
    /// Whether the consumer has to be woken after this transition.
    #[must_use]
    pub fn requires_wake(self) -> bool {
        !matches!(self, Self::AlreadyNonEmpty)
    }
}

/// Outcome of a conditional dequeue.
#[derive(Debug)]
#[expect(
    clippy::exhaustive_enums,
    reason = "callers branch on all three outcomes"
)]
pub enum PopIf {
    /// The head had the expected kind and has been removed.
    Popped(Event),

    /// The head has a different kind and is still queued.
    Mismatched(EventKind),

    /// The queue is empty.
    Empty,
}

/// Events in their own list nodes, outside of any queue chain.
///
/// Nodes are allocated here before the queue lock is taken and spliced into the chain under
/// the lock. Nodes detached under the lock come back in this form and are freed after the lock
/// has been released.
#[derive(Debug, Default)]
pub(crate) struct EventLinks {
    events: LinkedList<Event>,
}

impl EventLinks {
    /// Wraps `event` in a node ready to be spliced into a chain.
    ///
    /// # Panics
    ///
    /// Panics if the event is already on a queue.
    pub(crate) fn queued(event: Event) -> Self {
        event.mark_queued();

        let mut events = LinkedList::new();
        events.push_back(event);

        Self { events }
    }

    /// Takes the first detached event out, freeing its node.
    pub(crate) fn into_first(mut self) -> Option<Event> {
        let event = self.events.pop_front()?;
        event.mark_dequeued();
        Some(event)
    }

    /// Interprets a conditional detach of the head, given the head kind seen under the lock.
    pub(crate) fn into_pop_if(self, head_kind: Option<EventKind>) -> PopIf {
        match (self.into_first(), head_kind) {
            (Some(event), _) => PopIf::Popped(event),
            (None, Some(kind)) => PopIf::Mismatched(kind),
            (None, None) => PopIf::Empty,
        }
    }

    /// Releases every detached event, returning how many there were.
    pub(crate) fn release(self) -> usize {
        let count = self.events.len();

        for event in self.events {
            event.mark_dequeued();
            drop(event);
        }

        count
    }
}

/// The chain of unprocessed events. Only ever touched while holding the [`QueueCore`] mutex.
///
/// Every operation relinks existing nodes in O(1) and neither allocates nor frees memory.
#[derive(Debug, Default)]
pub(crate) struct EventChain {
    events: LinkedList<Event>,
}

impl EventChain {
    pub(crate) fn push_back(&mut self, mut link: EventLinks) -> Transition {
        let transition = self.transition();
        self.events.append(&mut link.events);
        transition
    }

    pub(crate) fn push_front(&mut self, mut link: EventLinks) -> Transition {
        let transition = self.transition();
        link.events.append(&mut self.events);
        mem::swap(&mut self.events, &mut link.events);
        transition
    }

    /// Replaces the whole chain with `link`, handing back the previous chain so the caller
    /// can release it after unlocking.
    pub(crate) fn replace(&mut self, link: EventLinks) -> EventLinks {
        EventLinks {
            events: mem::replace(&mut self.events, link.events),
        }
    }

    /// Detaches the head node, if any.
    pub(crate) fn take_front(&mut self) -> EventLinks {
        if self.events.is_empty() {
            return EventLinks::default();
        }

        // Splitting after the first node walks zero nodes.
        let rest = self.events.split_off(1);

        EventLinks {
            events: mem::replace(&mut self.events, rest),
        }
    }

    /// Detaches the head node only if `accept` approves of its kind.
    pub(crate) fn take_front_if(&mut self, accept: impl FnOnce(EventKind) -> bool) -> EventLinks {
        match self.head_kind() {
            Some(kind) if accept(kind) => self.take_front(),
            _ => EventLinks::default(),
        }
    }

    pub(crate) fn head_kind(&self) -> Option<EventKind> {
        self.events.front().map(Event::kind)
    }

    pub(crate) fn take_all(&mut self) -> EventLinks {
        EventLinks {
            events: mem::take(&mut self.events),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn transition(&self) -> Transition {
        if self.events.is_empty() {
            Transition::BecameNonEmpty
        } else {
            Transition::AlreadyNonEmpty
        }
    }
}

/// A mutex-guarded FIFO of [`Event`]s with front insertion, flush and predicate dequeue.
///
/// This is the storage shared by [`ThreadQueue`][crate::ThreadQueue] and
/// [`AppQueue`][crate::AppQueue]. Used on its own it never wakes anyone; the return values of
/// the enqueue operations tell the caller whether a consumer needs waking.
///
/// Every operation holds the lock only for O(1) relinking: list nodes are allocated before the
/// lock is taken and freed after it is released, and no user code runs under it. Events
/// discarded by a flush are released after the lock is dropped.
///
/// # Example
///
/// ```rust
/// use event_relay::{Event, EventKind, QueueCore, Transition};
///
/// let queue = QueueCore::new();
///
/// assert_eq!(
///     queue.enqueue_back(Event::new(EventKind::BUFFER, 0)),
///     Transition::BecameNonEmpty
/// );
/// assert_eq!(
///     queue.enqueue_back(Event::new(EventKind::END, 0)),
///     Transition::AlreadyNonEmpty
/// );
///
/// assert_eq!(queue.peek_kind(), Some(EventKind::BUFFER));
/// assert_eq!(queue.dequeue().unwrap().kind(), EventKind::BUFFER);
/// assert_eq!(queue.dequeue().unwrap().kind(), EventKind::END);
/// assert!(queue.dequeue().is_none());
/// ```
#[derive(Debug, Default)]
pub struct QueueCore {
    chain: Mutex<EventChain>,
}

impl QueueCore {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `event` as the new tail.
    ///
    /// # Panics
    ///
    /// Panics if the event is already on a queue.
    pub fn enqueue_back(&self, event: Event) -> Transition {
        let link = EventLinks::queued(event);
        self.lock().push_back(link)
    }

    /// Inserts `event` as the new head.
    ///
    /// # Panics
    ///
    /// Panics if the event is already on a queue.
    pub fn enqueue_front(&self, event: Event) -> Transition {
        let link = EventLinks::queued(event);
        self.lock().push_front(link)
    }

    /// Discards the whole queue and leaves `event` as its only item.
    ///
    /// Always returns [`Transition::Replaced`].
    ///
    /// # Panics
    ///
    /// Panics if the event is already on a queue.
    pub fn enqueue_flush(&self, event: Event) -> Transition {
        let link = EventLinks::queued(event);
        let discarded = self.lock().replace(link);

        let flush_count = discarded.release();

        if flush_count > 0 {
            debug!(flush_count, "replaced queued events");
        }

        Transition::Replaced
    }

    /// Enqueues `event` according to `placement`.
    ///
    /// # Panics
    ///
    /// Panics if the event is already on a queue.
    pub fn enqueue(&self, event: Event, placement: Placement) -> Transition {
        match placement {
            Placement::Back => self.enqueue_back(event),
            Placement::Front => self.enqueue_front(event),
            Placement::Flush => self.enqueue_flush(event),
        }
    }

    /// Removes and returns the head, or `None` if the queue is empty.
    #[must_use]
    pub fn dequeue(&self) -> Option<Event> {
        let head = self.lock().take_front();
        head.into_first()
    }

    /// The kind of the head without removing it, or `None` if the queue is empty.
    #[must_use]
    pub fn peek_kind(&self) -> Option<EventKind> {
        self.lock().head_kind()
    }

    /// Whether the head exists and is a control event.
    #[must_use]
    pub fn has_pending_control(&self) -> bool {
        self.peek_kind().is_some_and(EventKind::is_control)
    }

    /// Removes and returns the head only if its kind is `expected`.
    ///
    /// A mismatch leaves the queue untouched and is reported separately from an empty queue.
    #[must_use]
    pub fn dequeue_if(&self, expected: EventKind) -> PopIf {
        let mut chain = self.lock();
        let head_kind = chain.head_kind();
        let head = chain.take_front_if(|kind| kind == expected);
        drop(chain);

        head.into_pop_if(head_kind)
    }

    /// Removes and returns the head only if its kind is neither `kind_a` nor `kind_b`.
    #[must_use]
    pub fn dequeue_unless(&self, kind_a: EventKind, kind_b: EventKind) -> Option<Event> {
        let head = self
            .lock()
            .take_front_if(|kind| kind != kind_a && kind != kind_b);
        head.into_first()
    }

    /// Discards every queued event, returning how many were released.
    pub fn flush_all(&self) -> usize {
        let detached = self.lock().take_all();
        detached.release()
    }

    /// The number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, EventChain> {
        self.chain.lock()
    }
}

impl Drop for QueueCore {
    fn drop(&mut self) {
        self.chain.get_mut().take_all().release();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::alloc::System;
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;
    use testing::{CountingAllocator, DropTracker, heap_operations_during};

    use super::*;
    use crate::Payload;

    #[global_allocator]
    static ALLOCATOR: CountingAllocator<System> = CountingAllocator::system();

    assert_impl_all!(QueueCore: Send, Sync, Debug);
    assert_impl_all!(PopIf: Send, Sync, Debug);

    fn kinds(queue: &QueueCore) -> Vec<EventKind> {
        let mut kinds = Vec::new();
        while let Some(event) = queue.dequeue() {
            kinds.push(event.kind());
        }
        kinds
    }

    fn numbered(code: u16) -> Event {
        Event::new(EventKind::data(code), 0)
    }

    #[test]
    fn chain_relinking_never_touches_the_heap() {
        let mut chain = EventChain::default();
        let first = EventLinks::queued(numbered(1));
        let second = EventLinks::queued(numbered(2));
        let third = EventLinks::queued(numbered(3));
        let replacement = EventLinks::queued(numbered(4));

        let ((head, skipped, discarded, rest), heap_operations) = heap_operations_during(|| {
            assert_eq!(chain.push_back(first), Transition::BecameNonEmpty);
            assert_eq!(chain.push_back(second), Transition::AlreadyNonEmpty);
            assert_eq!(chain.push_front(third), Transition::AlreadyNonEmpty);

            let head = chain.take_front();
            let skipped = chain.take_front_if(|kind| kind == EventKind::QUIT);
            let discarded = chain.replace(replacement);
            let rest = chain.take_all();

            (head, skipped, discarded, rest)
        });

        assert_eq!(heap_operations, 0);

        assert_eq!(head.into_first().unwrap().kind(), EventKind::data(3));
        assert!(skipped.into_first().is_none());
        assert_eq!(discarded.release(), 2);
        assert_eq!(rest.release(), 1);
        assert!(chain.is_empty());
    }

    #[test]
    fn back_is_fifo() {
        let queue = QueueCore::new();

        for code in 1..=5 {
            queue.enqueue_back(numbered(code));
        }

        assert_eq!(kinds(&queue), (1..=5).map(EventKind::data).collect::<Vec<_>>());
    }

    #[test]
    fn front_preempts_existing_events() {
        let queue = QueueCore::new();
        queue.enqueue_back(numbered(1));
        queue.enqueue_back(numbered(2));

        assert_eq!(
            queue.enqueue_front(Event::new(EventKind::CLOSE, 0)),
            Transition::AlreadyNonEmpty
        );

        assert_eq!(
            kinds(&queue),
            vec![EventKind::CLOSE, EventKind::data(1), EventKind::data(2)]
        );
    }

    #[test]
    fn consecutive_fronts_are_last_in_first_out() {
        let queue = QueueCore::new();
        queue.enqueue_back(numbered(1));
        queue.enqueue_front(numbered(2));
        queue.enqueue_front(numbered(3));

        assert_eq!(
            kinds(&queue),
            vec![EventKind::data(3), EventKind::data(2), EventKind::data(1)]
        );
    }

    #[test]
    fn flush_supersedes_everything() {
        let tracker = DropTracker::new();
        let queue = QueueCore::new();

        for _ in 0..4 {
            queue.enqueue_back(Event::with_payload(
                EventKind::BUFFER,
                0,
                Payload::Custom(Box::new(tracker.token())),
            ));
        }

        assert_eq!(
            queue.enqueue_flush(Event::new(EventKind::FLUSH, 0)),
            Transition::Replaced
        );
        assert_eq!(tracker.dropped(), 4);

        assert_eq!(kinds(&queue), vec![EventKind::FLUSH]);
    }

    #[test]
    fn flush_on_empty_queue_still_replaces() {
        let queue = QueueCore::new();

        assert_eq!(
            queue.enqueue(numbered(1), Placement::Flush),
            Transition::Replaced
        );
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn transitions_report_empty_to_non_empty() {
        let queue = QueueCore::new();

        assert_eq!(queue.enqueue_front(numbered(1)), Transition::BecameNonEmpty);
        assert_eq!(queue.enqueue_back(numbered(2)), Transition::AlreadyNonEmpty);

        _ = kinds(&queue);

        assert_eq!(queue.enqueue_back(numbered(3)), Transition::BecameNonEmpty);
    }

    #[test]
    fn peek_does_not_remove() {
        let queue = QueueCore::new();
        assert_eq!(queue.peek_kind(), None);

        queue.enqueue_back(numbered(7));

        assert_eq!(queue.peek_kind(), Some(EventKind::data(7)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn pending_control_only_at_head() {
        let queue = QueueCore::new();
        assert!(!queue.has_pending_control());

        queue.enqueue_back(numbered(1));
        queue.enqueue_back(Event::new(EventKind::QUIT, 0));
        assert!(!queue.has_pending_control());

        queue.enqueue_front(Event::new(EventKind::SEEK, 0));
        assert!(queue.has_pending_control());
    }

    #[test]
    fn dequeue_if_distinguishes_mismatch_from_empty() {
        let queue = QueueCore::new();
        assert!(matches!(queue.dequeue_if(EventKind::BUFFER), PopIf::Empty));

        queue.enqueue_back(Event::new(EventKind::CONFIGURE, 0));

        assert!(matches!(
            queue.dequeue_if(EventKind::BUFFER),
            PopIf::Mismatched(EventKind::CONFIGURE)
        ));
        assert_eq!(queue.len(), 1);

        match queue.dequeue_if(EventKind::CONFIGURE) {
            PopIf::Popped(event) => assert_eq!(event.kind(), EventKind::CONFIGURE),
            other => panic!("expected the head to be popped, got {other:?}"),
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn dequeue_unless_leaves_excluded_kinds() {
        let queue = QueueCore::new();
        queue.enqueue_back(Event::new(EventKind::BUFFER, 0));
        queue.enqueue_back(Event::new(EventKind::META, 0));

        assert!(
            queue
                .dequeue_unless(EventKind::BUFFER, EventKind::CONFIGURE)
                .is_none()
        );
        assert_eq!(queue.len(), 2);

        queue.enqueue_front(Event::new(EventKind::PAUSE, 0));
        let popped = queue
            .dequeue_unless(EventKind::BUFFER, EventKind::CONFIGURE)
            .unwrap();
        assert_eq!(popped.kind(), EventKind::PAUSE);
    }

    #[test]
    fn flush_all_releases_and_counts() {
        let tracker = DropTracker::new();
        let queue = QueueCore::new();

        for _ in 0..3 {
            queue.enqueue_back(Event::with_payload(
                EventKind::META,
                0,
                Payload::Custom(Box::new(tracker.token())),
            ));
        }

        assert_eq!(queue.flush_all(), 3);
        assert_eq!(tracker.dropped(), 3);
        assert!(queue.is_empty());
        assert_eq!(queue.peek_kind(), None);
    }

    #[test]
    fn dropping_queue_releases_remaining_events() {
        let tracker = DropTracker::new();
        let queue = QueueCore::new();
        queue.enqueue_back(Event::with_payload(
            EventKind::META,
            0,
            Payload::Custom(Box::new(tracker.token())),
        ));

        drop(queue);

        assert_eq!(tracker.dropped(), 1);
    }

    #[test]
    fn dequeued_event_can_be_requeued() {
        let queue = QueueCore::new();
        queue.enqueue_back(numbered(1));

        let event = queue.dequeue().unwrap();
        assert!(!event.is_queued());

        queue.enqueue_front(event);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn flushed_out_handle_can_be_requeued() {
        let queue = QueueCore::new();
        let event = numbered(1);
        let kept = event.add_ref();
        queue.enqueue_back(event);

        queue.flush_all();

        assert!(!kept.is_queued());
        queue.enqueue_back(kept);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    #[should_panic]
    fn enqueue_shared_event_twice_panics() {
        let first = QueueCore::new();
        let second = QueueCore::new();
        let event = numbered(1);
        let other_handle = event.add_ref();

        first.enqueue_back(event);
        second.enqueue_back(other_handle);
    }
}
