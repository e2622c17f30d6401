use std::io;
use std::time::Duration;

use windows::Win32::Foundation::{
    CloseHandle, HANDLE, WAIT_EVENT, WAIT_FAILED, WAIT_OBJECT_0, WAIT_TIMEOUT,
};
use windows::Win32::System::Threading::{INFINITE, WaitForSingleObject};

/// Owned kernel object handle, closed on drop.
#[derive(Debug)]
pub(crate) struct OwnedHandle(HANDLE);

// SAFETY: Kernel object handles are process-wide values that any thread may use.
unsafe impl Send for OwnedHandle {}
// SAFETY: All operations we perform on the handle are thread-safe kernel calls.
unsafe impl Sync for OwnedHandle {}

impl OwnedHandle {
    pub(crate) fn new(handle: HANDLE) -> Self {
        Self(handle)
    }

    pub(crate) fn get(&self) -> HANDLE {
        self.0
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        // Errors from CloseHandle() are not actionable; the handle is gone either way.
        // SAFETY: We own the handle and never use it again.
        _ = unsafe { CloseHandle(self.0) };
    }
}

/// Converts a timeout to the millisecond form the wait functions expect, rounding up.
pub(crate) fn timeout_ms(timeout: Option<Duration>) -> u32 {
    match timeout {
        None => INFINITE,
        Some(timeout) => {
            let millis = timeout.as_nanos().div_ceil(1_000_000);
            u32::try_from(millis).unwrap_or(INFINITE - 1)
        }
    }
}

/// Interprets the result of a single-object wait. Returns whether the object was signaled.
fn wait_outcome(result: WAIT_EVENT) -> io::Result<bool> {
    if result == WAIT_OBJECT_0 {
        Ok(true)
    } else if result == WAIT_TIMEOUT {
        Ok(false)
    } else if result == WAIT_FAILED {
        Err(io::Error::last_os_error())
    } else {
        Err(io::Error::other(format!(
            "unexpected wait result {:#x}",
            result.0
        )))
    }
}

pub(crate) fn wait_single(handle: HANDLE, timeout: Option<Duration>) -> io::Result<bool> {
    // SAFETY: The handle is a valid waitable object for the duration of the call.
    let result = unsafe { WaitForSingleObject(handle, timeout_ms(timeout)) };

    wait_outcome(result)
}
