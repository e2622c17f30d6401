use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

use crate::pal::{Bindings, BindingsFacade, wait_readable};

/// Byte pipe carrying framed messages from any thread to the event loop thread.
///
/// The read end is non-blocking so the event loop never stalls on a spurious wake-up. The write
/// end is blocking so a writer never observes a partial write because the pipe was momentarily
/// full.
#[derive(Debug)]
pub(crate) struct PlatformPipe {
    read: RawFd,
    write: RawFd,
    bindings: BindingsFacade,
}

impl PlatformPipe {
    pub(crate) fn new() -> io::Result<Self> {
        Self::with_bindings(BindingsFacade::target())
    }

    pub(crate) fn with_bindings(bindings: BindingsFacade) -> io::Result<Self> {
        let [read, write] = bindings.pipe()?;

        if let Err(error) = bindings.set_nonblocking(read) {
            bindings.close(read);
            bindings.close(write);
            return Err(error);
        }

        Ok(Self {
            read,
            write,
            bindings,
        })
    }

    /// Performs a single write. The caller decides what a short write means.
    pub(crate) fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.bindings.write(self.write, buf)
    }

    /// Performs a single non-blocking read. Fails with `WouldBlock` if nothing is buffered.
    pub(crate) fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.bindings.read(self.read, buf)
    }

    pub(crate) fn wait_readable(&self, timeout: Option<Duration>) -> io::Result<bool> {
        wait_readable(&self.bindings, self.read, timeout)
    }

    /// Called once per completely written frame. The pipe itself is the readiness source here.
    #[expect(
        clippy::unnecessary_wraps,
        reason = "signature shared with platforms that signal a separate wake object"
    )]
    #[expect(
        clippy::unused_self,
        reason = "signature shared with platforms that signal a separate wake object"
    )]
    pub(crate) fn frame_posted(&self) -> io::Result<()> {
        Ok(())
    }

    #[expect(
        clippy::unused_self,
        reason = "signature shared with platforms that signal a separate wake object"
    )]
    pub(crate) fn frame_consumed(&self) {}

    pub(crate) fn wait_handle(&self) -> RawFd {
        self.read
    }
}

impl Drop for PlatformPipe {
    fn drop(&mut self) {
        self.bindings.close(self.read);
        self.bindings.close(self.write);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::pal::MockBindings;

    #[test]
    fn only_read_end_is_nonblocking() {
        let mut bindings = MockBindings::new();

        bindings.expect_pipe().returning(|| Ok([20, 21]));
        bindings
            .expect_set_nonblocking()
            .with(eq(20))
            .times(1)
            .returning(|_| Ok(()));
        bindings.expect_close().times(2).return_const(());

        let pipe = PlatformPipe::with_bindings(BindingsFacade::from_mock(bindings)).unwrap();

        assert_eq!(pipe.wait_handle(), 20);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call FFI functions")]
    fn real_pipe_carries_bytes() {
        let pipe = PlatformPipe::new().unwrap();

        assert_eq!(
            pipe.read(&mut [0; 4]).unwrap_err().kind(),
            io::ErrorKind::WouldBlock
        );
        assert!(!pipe.wait_readable(Some(Duration::ZERO)).unwrap());

        assert_eq!(pipe.write(b"abc").unwrap(), 3);
        pipe.frame_posted().unwrap();
        assert!(pipe.wait_readable(Some(Duration::ZERO)).unwrap());

        let mut buf = [0; 8];
        let read = pipe.read(&mut buf).unwrap();
        assert_eq!(buf.get(..read), Some(&b"abc"[..]));
    }
}
