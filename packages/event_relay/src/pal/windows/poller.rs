use std::io;
use std::os::windows::io::RawHandle;
use std::time::Duration;

use windows::Win32::Foundation::{HANDLE, WAIT_FAILED, WAIT_OBJECT_0, WAIT_TIMEOUT};
use windows::Win32::System::Threading::{MAXIMUM_WAIT_OBJECTS, WaitForMultipleObjects};

use crate::pal::windows::timeout_ms;

/// Waits for any of a set of waitable objects to become signaled.
#[derive(Debug, Default)]
pub(crate) struct PlatformPoller;

impl PlatformPoller {
    pub(crate) fn new() -> Self {
        Self
    }

    /// Returns the position in `handles` of the object that was signaled. At most one position
    /// is reported per wait, as a successful wait may consume the signal (e.g. a semaphore).
    ///
    /// An empty result means the timeout elapsed.
    #[expect(
        clippy::unused_self,
        reason = "signature shared with platforms where the poller carries bindings"
    )]
    pub(crate) fn wait(
        &self,
        handles: &[RawHandle],
        timeout: Option<Duration>,
    ) -> io::Result<Vec<usize>> {
        if handles.len() > MAXIMUM_WAIT_OBJECTS as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot wait on more than {MAXIMUM_WAIT_OBJECTS} handles at once"),
            ));
        }

        let handles = handles.iter().map(|&handle| HANDLE(handle)).collect::<Vec<_>>();

        // SAFETY: All handles are valid waitable objects for the duration of the call.
        let result = unsafe { WaitForMultipleObjects(&handles, false, timeout_ms(timeout)) };

        if result == WAIT_TIMEOUT {
            return Ok(Vec::new());
        }

        if result == WAIT_FAILED {
            return Err(io::Error::last_os_error());
        }

        let index = result.0.wrapping_sub(WAIT_OBJECT_0.0) as usize;

        if index < handles.len() {
            Ok(vec![index])
        } else {
            Err(io::Error::other(format!(
                "unexpected wait result {:#x}",
                result.0
            )))
        }
    }
}
