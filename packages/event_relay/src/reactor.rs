use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::pal::PlatformPoller;
use crate::{Result, WaitHandle};

/// Callback invoked on the event loop thread when its input becomes ready.
pub type InputCallback = Arc<dyn Fn() + Send + Sync>;

/// A readiness-polling event loop that can watch additional operating system handles.
///
/// [`MessageChannel::attach()`][crate::MessageChannel::attach] uses this to hook a channel into
/// whatever loop the application runs. Implement it for the application's own loop, or use the
/// bundled [`Reactor`].
#[cfg_attr(test, mockall::automock)]
pub trait InputRegistry: Send + Sync {
    /// Starts watching `handle`, invoking `callback` on the loop thread whenever it is ready.
    ///
    /// Adding a handle that is already watched replaces its callback.
    fn add_input(&self, handle: WaitHandle, callback: InputCallback);

    /// Stops watching `handle`. Returns whether it was being watched.
    fn remove_input(&self, handle: WaitHandle) -> bool;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct InputHandle(WaitHandle);

// SAFETY: Kernel handles are not tied to the thread that created them.
#[cfg(windows)]
unsafe impl Send for InputHandle {}
// SAFETY: Kernel handles are not tied to the thread that created them.
#[cfg(windows)]
unsafe impl Sync for InputHandle {}

#[derive(Clone)]
struct Input {
    handle: InputHandle,
    callback: InputCallback,
}

/// A minimal single-threaded event loop that dispatches callbacks for ready handles.
///
/// The thread calling [`run_once()`][Reactor::run_once] is the loop thread: all callbacks run
/// there, with no reactor lock held, so they may add or remove inputs. Inputs can be added and
/// removed from any thread.
///
/// On Unix this waits with `poll()`. On Windows it waits with `WaitForMultipleObjects()`, which
/// limits it to 64 inputs and reports one ready input per round.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// use event_relay::{Event, EventKind, InputRegistry, Placement, Reactor, ThreadQueue};
///
/// let reactor = Reactor::new();
/// let queue = Arc::new(ThreadQueue::new()?);
///
/// let saw_quit = Arc::new(AtomicBool::new(false));
/// let consumer = Arc::clone(&queue);
/// let flag = Arc::clone(&saw_quit);
/// reactor.add_input(
///     queue.wait_handle(),
///     Arc::new(move || {
///         while let Some(event) = consumer.pop() {
///             if event.kind() == EventKind::QUIT {
///                 flag.store(true, Ordering::Relaxed);
///             }
///         }
///     }),
/// );
///
/// queue.post(Event::new(EventKind::QUIT, 0), Placement::Front)?;
///
/// assert_eq!(reactor.run_pending()?, 1);
/// assert!(saw_quit.load(Ordering::Relaxed));
/// # Ok::<(), event_relay::Error>(())
/// ```
pub struct Reactor {
    inputs: Mutex<Vec<Input>>,
    poller: PlatformPoller,
}

impl Reactor {
    /// Creates a reactor without any inputs.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inputs: Mutex::new(Vec::new()),
            poller: PlatformPoller::new(),
        }
    }

    /// Waits up to `timeout` (forever if `None`) for inputs to become ready and invokes their
    /// callbacks. Returns the number of callbacks invoked.
    ///
    /// Returns zero immediately if no inputs are registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`][crate::Error::Io] if waiting fails, including when more handles
    /// are registered than the platform can wait on at once.
    pub fn run_once(&self, timeout: Option<Duration>) -> Result<usize> {
        let snapshot = self.inputs.lock().clone();

        if snapshot.is_empty() {
            return Ok(0);
        }

        let handles = snapshot
            .iter()
            .map(|input| input.handle.0)
            .collect::<Vec<_>>();

        let ready = self.poller.wait(&handles, timeout)?;

        let mut dispatched: usize = 0;

        for input in ready.into_iter().filter_map(|index| snapshot.get(index)) {
            // An earlier callback in this round may have removed or replaced the input.
            if !self.is_current(input) {
                continue;
            }

            trace!(handle = ?input.handle.0, "input ready");
            (input.callback)();
            dispatched = dispatched.saturating_add(1);
        }

        Ok(dispatched)
    }

    /// Invokes callbacks for ready inputs without blocking, round after round, until a round
    /// finds nothing ready. Returns the total number of callbacks invoked.
    ///
    /// Callbacks must consume the readiness of their input (e.g. by draining a queue or reading
    /// a frame), otherwise this never returns.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by [`run_once()`][Self::run_once].
    pub fn run_pending(&self) -> Result<usize> {
        let mut total: usize = 0;

        loop {
            match self.run_once(Some(Duration::ZERO))? {
                0 => return Ok(total),
                dispatched => total = total.saturating_add(dispatched),
            }
        }
    }

    /// The number of registered inputs.
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.inputs.lock().len()
    }

    fn is_current(&self, input: &Input) -> bool {
        self.inputs
            .lock()
            .iter()
            .any(|current| Arc::ptr_eq(&current.callback, &input.callback))
    }
}

impl InputRegistry for Reactor {
    fn add_input(&self, handle: WaitHandle, callback: InputCallback) {
        let handle = InputHandle(handle);
        let mut inputs = self.inputs.lock();

        if let Some(existing) = inputs.iter_mut().find(|input| input.handle == handle) {
            existing.callback = callback;
        } else {
            inputs.push(Input { handle, callback });
        }

        debug!(handle = ?handle.0, inputs = inputs.len(), "added reactor input");
    }

    fn remove_input(&self, handle: WaitHandle) -> bool {
        let handle = InputHandle(handle);
        let mut inputs = self.inputs.lock();

        let before = inputs.len();
        inputs.retain(|input| input.handle != handle);
        let removed = inputs.len() != before;

        if removed {
            debug!(handle = ?handle.0, inputs = inputs.len(), "removed reactor input");
        }

        removed
    }
}

impl Default for Reactor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Reactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactor")
            .field("inputs", &self.input_count())
            .field("poller", &self.poller)
            .finish()
    }
}
