use std::io;
use std::os::windows::io::RawHandle;
use std::thread;
use std::time::{Duration, Instant};

use windows::Win32::Foundation::HANDLE;
use windows::Win32::Storage::FileSystem::{ReadFile, WriteFile};
use windows::Win32::System::Pipes::{CreatePipe, PeekNamedPipe};
use windows::Win32::System::Threading::{CreateSemaphoreW, ReleaseSemaphore};
use windows::core::PCWSTR;

use crate::pal::windows::{OwnedHandle, wait_single};

// Anonymous pipes cannot be waited on, so readers poll for buffered bytes at this interval.
const READ_POLL_INTERVAL: Duration = Duration::from_millis(1);

// Room for several maximum-size frames, so a thread can post to itself without blocking.
const PIPE_BUFFER_BYTES: u32 = 64 * 1024;

/// Byte pipe carrying framed messages to the event loop thread, paired with a counting
/// semaphore that is released once per frame.
///
/// Anonymous pipes are not waitable objects, so event loops wait on the semaphore instead.
/// Each successful wait consumes one count, matching exactly one frame.
#[derive(Debug)]
pub(crate) struct PlatformPipe {
    read: OwnedHandle,
    write: OwnedHandle,
    frames: OwnedHandle,
}

impl PlatformPipe {
    pub(crate) fn new() -> io::Result<Self> {
        let mut read = HANDLE::default();
        let mut write = HANDLE::default();

        // SAFETY: The out pointers are valid for writing one handle each.
        unsafe { CreatePipe(&raw mut read, &raw mut write, None, PIPE_BUFFER_BYTES) }?;

        let read = OwnedHandle::new(read);
        let write = OwnedHandle::new(write);

        // SAFETY: No safety requirements beyond passing valid arguments.
        let frames = unsafe { CreateSemaphoreW(None, 0, i32::MAX, PCWSTR::null()) }?;

        Ok(Self {
            read,
            write,
            frames: OwnedHandle::new(frames),
        })
    }

    /// Performs a single write. The caller decides what a short write means.
    pub(crate) fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut written = 0_u32;

        // SAFETY: The buffer and the out pointer are valid for the duration of the call.
        unsafe { WriteFile(self.write.get(), Some(buf), Some(&raw mut written), None) }?;

        Ok(written as usize)
    }

    /// Performs a single read of whatever is buffered. Fails with `WouldBlock` if nothing is.
    pub(crate) fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.available()?;

        if available == 0 {
            return Err(io::ErrorKind::WouldBlock.into());
        }

        let wanted = buf.len().min(available as usize);
        let target = buf
            .get_mut(..wanted)
            .ok_or_else(|| io::Error::from(io::ErrorKind::InvalidInput))?;
        let mut read = 0_u32;

        // SAFETY: The buffer and the out pointer are valid for the duration of the call. The
        // read cannot block because at least `wanted` bytes are buffered.
        unsafe { ReadFile(self.read.get(), Some(target), Some(&raw mut read), None) }?;

        Ok(read as usize)
    }

    pub(crate) fn wait_readable(&self, timeout: Option<Duration>) -> io::Result<bool> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);

        loop {
            if self.available()? > 0 {
                return Ok(true);
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Ok(false);
            }

            thread::sleep(READ_POLL_INTERVAL);
        }
    }

    pub(crate) fn frame_posted(&self) -> io::Result<()> {
        // SAFETY: The handle is a valid semaphore owned by us.
        unsafe { ReleaseSemaphore(self.frames.get(), 1, None) }?;
        Ok(())
    }

    /// Takes one frame announcement without blocking, for a frame that was read without a
    /// prior wait on the semaphore.
    pub(crate) fn frame_consumed(&self) {
        // A concurrent waiter may have taken the count already, leaving nothing to take.
        _ = wait_single(self.frames.get(), Some(Duration::ZERO));
    }

    pub(crate) fn wait_handle(&self) -> RawHandle {
        self.frames.get().0
    }

    fn available(&self) -> io::Result<u32> {
        let mut available = 0_u32;

        // SAFETY: The out pointer is valid for the duration of the call.
        unsafe {
            PeekNamedPipe(
                self.read.get(),
                None,
                0,
                None,
                Some(&raw mut available),
                None,
            )
        }?;

        Ok(available)
    }
}
