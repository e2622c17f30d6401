use std::fmt::Debug;

use crate::{Result, Transition};

/// Wakes the consumer of a [`Queue`][crate::Queue] when it has work.
///
/// A queue calls [`notify()`][Notify::notify] after every enqueue, once its lock has been
/// released, passing the [`Transition`] the enqueue caused. It calls [`reset()`][Notify::reset]
/// while still holding its lock whenever a dequeue leaves the queue empty, so that a reset can
/// never race with a concurrent enqueue and swallow its wake-up.
///
/// Implementations decide for themselves which transitions need a wake-up. A level-triggered
/// signal only needs to be set on [`Transition::requires_wake()`], whereas a message channel
/// that dispatches one pop per message has to be notified for every enqueue.
#[cfg_attr(test, mockall::automock)]
pub trait Notify: Debug + Send + Sync + 'static {
    /// Informs the consumer that an enqueue caused `transition`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying wake mechanism fails. The event has been queued
    /// regardless and will be seen on the next successful wake-up.
    fn notify(&self, transition: Transition) -> Result<()>;

    /// Informs the consumer that the queue has been drained.
    fn reset(&self);
}
