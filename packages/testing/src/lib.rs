#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for tests, benchmarks and examples in `event_relay`.

mod heap;

pub use heap::*;

use std::env;
use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Runs a test body on a separate thread and fails the test if it does not finish in time.
///
/// Tests that block on signals, pipes or other threads use this so that a lost wake-up shows
/// up as a test failure instead of a hung test run. The limit is 10 seconds, or 60 seconds
/// under Miri.
///
/// Setting `MUTATION_TESTING=1` runs the body directly, so that mutation testing can observe
/// hangs introduced by mutations.
///
/// # Panics
///
/// Panics if the body exceeds the limit. Panics raised by the body are propagated.
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// let answer = with_watchdog(|| 6 * 7);
/// assert_eq!(answer, 42);
/// ```
pub fn with_watchdog<F, R>(body: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return body();
    }

    let limit = if cfg!(miri) {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(10)
    };

    let (result_tx, result_rx) = mpsc::channel();

    let runner = thread::Builder::new()
        .name("watchdog-test".to_string())
        .spawn(move || {
            // The receiver is gone if the watchdog already gave up.
            _ = result_tx.send(body());
        })
        .expect("spawning the test thread must succeed");

    match result_rx.recv_timeout(limit) {
        Ok(result) => {
            runner.join().expect("test thread finished after sending its result");
            result
        }
        Err(RecvTimeoutError::Timeout) => {
            panic!("test did not finish within {limit:?}, probably a lost wake-up or deadlock")
        }
        Err(RecvTimeoutError::Disconnected) => match runner.join() {
            Ok(()) => panic!("test thread exited without producing a result"),
            Err(payload) => panic::resume_unwind(payload),
        },
    }
}

/// Counts how many of its [`DropToken`]s have been dropped.
///
/// Put a token into a payload to observe when (and how often) the payload is torn down.
///
/// # Example
///
/// ```rust
/// use testing::DropTracker;
///
/// let tracker = DropTracker::new();
/// let token = tracker.token();
/// assert_eq!(tracker.dropped(), 0);
///
/// drop(token);
/// assert_eq!(tracker.dropped(), 1);
/// ```
#[derive(Debug, Default)]
pub struct DropTracker {
    dropped: Arc<AtomicUsize>,
}

impl DropTracker {
    /// Creates a tracker with no tokens dropped yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token that increments this tracker's count when dropped.
    #[must_use]
    pub fn token(&self) -> DropToken {
        DropToken {
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// How many tokens of this tracker have been dropped so far.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Acquire)
    }
}

/// Increments the count of the [`DropTracker`] it came from when dropped.
#[derive(Debug)]
pub struct DropToken {
    dropped: Arc<AtomicUsize>,
}

impl Drop for DropToken {
    fn drop(&mut self) {
        self.dropped.fetch_add(1, Ordering::AcqRel);
    }
}

/// Runs `produce` on `producers` threads at once, passing each its index, and returns the
/// results in index order.
///
/// # Panics
///
/// Propagates a panic from any producer.
///
/// # Example
///
/// ```rust
/// use testing::run_producers;
///
/// let squares = run_producers(4, |index| index * index);
/// assert_eq!(squares, vec![0, 1, 4, 9]);
/// ```
pub fn run_producers<F, R>(producers: usize, produce: F) -> Vec<R>
where
    F: Fn(usize) -> R + Sync,
    R: Send,
{
    let produce = &produce;

    thread::scope(|s| {
        let handles = (0..producers)
            .map(|index| s.spawn(move || produce(index)))
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(payload) => panic::resume_unwind(payload),
            })
            .collect()
    })
}
