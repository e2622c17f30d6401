#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Moves typed events from producer threads to a single consumer, which is either a dedicated
//! worker thread or the thread running a foreign readiness-polling event loop.
//!
//! A media pipeline has decoder and output workers that need to tell each other (and the
//! application) about state changes, errors, timing updates, metadata and control requests.
//! This package provides the queues and wake-up machinery for that traffic:
//!
//! * [`Event`] - a reference-counted notification with an [`EventKind`], a [`StreamId`] and a
//!   [`Payload`].
//! * [`QueueCore`] - a mutex-guarded FIFO of events with front insertion, flush-and-replace and
//!   predicate-based dequeue.
//! * [`Signal`] - an OS-level wake primitive whose [`WaitHandle`] can be polled by other loops.
//! * [`ThreadQueue`] - a queue that wakes a dedicated consumer thread through a [`Signal`].
//! * [`MessageChannel`] - a pipe-based framing protocol that invokes a registered handler on the
//!   thread running a foreign event loop.
//! * [`AppQueue`] - a queue that wakes a foreign event loop through a [`MessageChannel`].
//! * [`Reactor`] - a minimal readiness-polling loop implementing [`InputRegistry`].
//!
//! # Worker thread consumer
//!
//! ```rust
//! use std::thread;
//!
//! use event_relay::{Event, EventKind, Placement, ThreadQueue};
//!
//! let queue = ThreadQueue::new()?;
//!
//! thread::scope(|s| {
//!     s.spawn(|| {
//!         queue
//!             .post(Event::new(EventKind::BEGIN_OF_STREAM, 1), Placement::Back)
//!             .unwrap();
//!         queue.post(Event::new(EventKind::QUIT, 1), Placement::Front).unwrap();
//!     });
//! });
//!
//! // Control events posted to the front are observed first.
//! let first = queue.wait()?;
//! assert_eq!(first.kind(), EventKind::QUIT);
//! # Ok::<(), event_relay::Error>(())
//! ```
//!
//! # Event loop consumer
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use event_relay::{AppQueue, Event, EventKind, MessageChannel, Placement, Reactor};
//!
//! let reactor = Arc::new(Reactor::new());
//! let channel = MessageChannel::new()?;
//! channel.attach(Arc::clone(&reactor));
//!
//! let seen = Arc::new(AtomicUsize::new(0));
//! let seen_by_loop = Arc::clone(&seen);
//! let queue = AppQueue::new(&channel, move |event: Event| {
//!     assert_eq!(event.kind(), EventKind::STATE_PLAYING);
//!     seen_by_loop.fetch_add(1, Ordering::Relaxed);
//! });
//!
//! queue.post(Event::new(EventKind::STATE_PLAYING, 0), Placement::Back)?;
//!
//! // The loop thread (here: the current thread) dispatches the handler.
//! reactor.run_pending()?;
//! assert_eq!(seen.load(Ordering::Relaxed), 1);
//! # Ok::<(), event_relay::Error>(())
//! ```

mod app_queue;
mod channel;
mod error;
mod event;
mod event_kind;
mod notify;
mod pal;
mod payload;
mod queue;
mod queue_core;
mod reactor;
mod signal;

pub use app_queue::*;
pub use channel::*;
pub use error::*;
pub use event::*;
pub use event_kind::*;
pub use notify::*;
pub use pal::WaitHandle;
pub use payload::*;
pub use queue::*;
pub use queue_core::*;
pub use reactor::*;
pub use signal::*;
