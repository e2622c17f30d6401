use std::io;
use std::time::Duration;

use tracing::warn;

use crate::pal::PlatformSignal;
use crate::{Error, Notify, Result, Transition, WaitHandle};

/// A level-triggered wake primitive backed by an operating system object.
///
/// Once [`signal()`][Signal::signal] has been called, every wait completes immediately until
/// [`clear()`][Signal::clear] is called. Signaling an already-set signal has no further effect.
///
/// The [`wait_handle()`][Signal::wait_handle] can be registered with any readiness-polling loop
/// (e.g. `poll()` on Unix or `WaitForMultipleObjects()` on Windows), so a consumer thread can
/// wait for queued events alongside its own I/O.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
///
/// use event_relay::Signal;
///
/// let signal = Signal::new()?;
/// assert!(!signal.is_set()?);
///
/// signal.signal()?;
/// signal.signal()?;
/// assert!(signal.wait_timeout(Duration::from_secs(1))?);
///
/// signal.clear();
/// assert!(!signal.is_set()?);
/// # Ok::<(), event_relay::Error>(())
/// ```
#[derive(Debug)]
pub struct Signal {
    platform: PlatformSignal,
}

impl Signal {
    /// Creates a signal in the cleared state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`] if the operating system refuses to create the wake
    /// object, for example because the process is out of file descriptors.
    pub fn new() -> Result<Self> {
        Self::from_platform(PlatformSignal::new())
    }

    pub(crate) fn from_platform(platform: io::Result<PlatformSignal>) -> Result<Self> {
        let platform = platform.map_err(Error::resource("wake signal"))?;

        Ok(Self { platform })
    }

    /// Sets the signal, waking any waiter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the operating system call fails.
    pub fn signal(&self) -> Result<()> {
        self.platform.set().map_err(|error| {
            warn!(%error, "failed to set wake signal");
            Error::Io(error)
        })
    }

    /// Clears the signal. Waits block again until the next [`signal()`][Self::signal].
    pub fn clear(&self) {
        self.platform.clear();
    }

    /// Blocks until the signal is set. Does not clear it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the operating system call fails.
    pub fn wait(&self) -> Result<()> {
        while !self.platform.wait(None)? {}
        Ok(())
    }

    /// Blocks until the signal is set or `timeout` elapses. Returns whether the signal is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the operating system call fails.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<bool> {
        Ok(self.platform.wait(Some(timeout))?)
    }

    /// Whether the signal is currently set. Does not block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the operating system call fails.
    pub fn is_set(&self) -> Result<bool> {
        self.wait_timeout(Duration::ZERO)
    }

    /// The handle that becomes readable while the signal is set.
    ///
    /// The handle remains owned by the signal and is closed when the signal is dropped.
    #[must_use]
    pub fn wait_handle(&self) -> WaitHandle {
        self.platform.wait_handle()
    }
}

impl Notify for Signal {
    fn notify(&self, transition: Transition) -> Result<()> {
        if transition.requires_wake() {
            self.signal()
        } else {
            Ok(())
        }
    }

    fn reset(&self) {
        self.clear();
    }
}
