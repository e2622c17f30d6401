use std::sync::Arc;

use tracing::trace;

use crate::{
    Event, HandlerId, MessageChannel, Notify, OpCode, Queue, QueueBuilder, QueueCore, Result,
    Transition,
};

/// Wakes a foreign event loop by posting one drain message per enqueued event.
///
/// Each message makes the loop pop exactly one event, so every post is matched by exactly one
/// dispatch regardless of how the queue transitioned. Once the channel has been torn down,
/// notifying fails with [`Error::ChannelClosed`][crate::Error::ChannelClosed] and the event
/// stays queued until the queue is flushed or dropped.
#[derive(Debug)]
pub struct ChannelNotify {
    channel: MessageChannel,
    handler: HandlerId,
}

impl ChannelNotify {
    /// Operation code of the drain messages.
    pub const DRAIN_OP: OpCode = 1;

    /// The channel the drain messages are posted to.
    #[must_use]
    pub fn channel(&self) -> &MessageChannel {
        &self.channel
    }

    /// The handler that pops and dispatches one event per drain message.
    #[must_use]
    pub fn handler(&self) -> HandlerId {
        self.handler
    }
}

impl Notify for ChannelNotify {
    fn notify(&self, _transition: Transition) -> Result<()> {
        self.channel.post(self.handler, Self::DRAIN_OP, None)
    }

    fn reset(&self) {}
}

impl Drop for ChannelNotify {
    fn drop(&mut self) {
        self.channel.unregister(self.handler);
    }
}

/// A queue consumed on the thread of a foreign event loop.
///
/// Every post sends a drain message through a [`MessageChannel`]. When the loop dispatches it,
/// one event is popped and handed to the callback given at construction, on the loop thread.
///
/// The channel must be attached to the event loop (see [`MessageChannel::attach()`]) or drained
/// manually for events to be delivered.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use event_relay::{AppQueue, Event, EventKind, MessageChannel, Metadata, Payload, Placement};
///
/// let channel = MessageChannel::new()?;
///
/// let titles = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&titles);
/// let queue = AppQueue::new(&channel, move |event: Event| {
///     if let Payload::Metadata(metadata) = event.payload() {
///         sink.lock().unwrap().push(metadata.title.clone());
///     }
/// });
///
/// queue.post(
///     Event::with_payload(
///         EventKind::META,
///         0,
///         Payload::Metadata(Metadata::new("Intro", "Someone", "Debut")),
///     ),
///     Placement::Back,
/// )?;
///
/// channel.drain()?;
/// assert_eq!(*titles.lock().unwrap(), vec!["Intro".to_string()]);
/// # Ok::<(), event_relay::Error>(())
/// ```
pub type AppQueue = Queue<ChannelNotify>;

impl Queue<ChannelNotify> {
    /// Creates an application queue that delivers its events to `on_event` on the thread that
    /// services `channel`.
    #[must_use]
    pub fn new<F>(channel: &MessageChannel, on_event: F) -> Self
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        QueueBuilder::new().build_on_channel(channel, on_event)
    }
}

impl QueueBuilder {
    /// Builds an [`AppQueue`] whose events are delivered to `on_event` on the thread that
    /// services `channel`.
    #[must_use]
    pub fn build_on_channel<F>(self, channel: &MessageChannel, on_event: F) -> AppQueue
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        let core = Arc::new(QueueCore::new());
        let drained = Arc::downgrade(&core);

        let handler = channel.register(move |op, _payload| {
            if op != ChannelNotify::DRAIN_OP {
                return;
            }

            // The queue may already be gone, with its drain messages still in flight.
            let Some(core) = drained.upgrade() else {
                return;
            };

            let event = core.dequeue();
            drop(core);

            // A flush may have removed the event this message was sent for.
            if let Some(event) = event {
                trace!(kind = ?event.kind(), "delivering event on event loop thread");
                on_event(event);
            }
        });

        let notify = ChannelNotify {
            channel: channel.clone(),
            handler,
        };

        Queue::from_parts(core, notify, self.into_name())
    }
}
