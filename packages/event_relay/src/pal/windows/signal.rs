use std::io;
use std::os::windows::io::RawHandle;
use std::time::Duration;

use windows::Win32::System::Threading::{CreateEventW, ResetEvent, SetEvent};
use windows::core::PCWSTR;

use crate::pal::windows::{OwnedHandle, wait_single};

/// Level-triggered wake primitive backed by a manual-reset event object.
#[derive(Debug)]
pub(crate) struct PlatformSignal {
    event: OwnedHandle,
}

impl PlatformSignal {
    pub(crate) fn new() -> io::Result<Self> {
        // SAFETY: No safety requirements beyond passing valid arguments.
        let event = unsafe { CreateEventW(None, true, false, PCWSTR::null()) }?;

        Ok(Self {
            event: OwnedHandle::new(event),
        })
    }

    pub(crate) fn set(&self) -> io::Result<()> {
        // SAFETY: The handle is a valid event object owned by us.
        unsafe { SetEvent(self.event.get()) }?;
        Ok(())
    }

    pub(crate) fn clear(&self) {
        // Failing to reset only causes a spurious wake-up, which consumers tolerate.
        // SAFETY: The handle is a valid event object owned by us.
        _ = unsafe { ResetEvent(self.event.get()) };
    }

    pub(crate) fn wait(&self, timeout: Option<Duration>) -> io::Result<bool> {
        wait_single(self.event.get(), timeout)
    }

    pub(crate) fn wait_handle(&self) -> RawHandle {
        self.event.get().0
    }
}
