use std::io;
use std::os::fd::RawFd;

use libc::{c_int, c_void, nfds_t, pollfd};

use crate::pal::Bindings;

/// FFI bindings that target the real operating system that the build is targeting.
///
/// You would only use different bindings in PAL unit tests that need to use mock bindings.
/// Even then, whenever possible, unit tests should use real bindings for maximum realism.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetBindings;

// Calls `syscall` until it stops failing with EINTR.
fn retry_interrupted(mut syscall: impl FnMut() -> isize) -> io::Result<usize> {
    loop {
        let result = syscall();

        if let Ok(transferred) = usize::try_from(result) {
            return Ok(transferred);
        }

        let error = io::Error::last_os_error();

        if error.kind() != io::ErrorKind::Interrupted {
            return Err(error);
        }
    }
}

fn check(result: c_int) -> io::Result<c_int> {
    if result < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(result)
    }
}

// Real OS bindings are excluded from coverage measurement because:
// 1. They are exercised by every test that creates a real queue or channel.
// 2. Error paths require OS-level failures that are impractical to trigger in tests.
#[cfg_attr(coverage_nightly, coverage(off))]
impl Bindings for BuildTargetBindings {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn eventfd(&self) -> io::Result<RawFd> {
        // SAFETY: No safety requirements.
        check(unsafe { libc::eventfd(0, libc::EFD_CLOEXEC | libc::EFD_NONBLOCK) })
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    fn eventfd(&self) -> io::Result<RawFd> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn pipe(&self) -> io::Result<[RawFd; 2]> {
        let mut fds: [c_int; 2] = [-1; 2];

        // SAFETY: The pointer is valid for writing two descriptors.
        check(unsafe { libc::pipe(fds.as_mut_ptr()) })?;

        let [read, write] = fds;

        for fd in [read, write] {
            // SAFETY: The descriptor was just created by pipe() and is owned by us.
            let result = check(unsafe { libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC) });

            if let Err(error) = result {
                self.close(read);
                self.close(write);
                return Err(error);
            }
        }

        Ok([read, write])
    }

    fn set_nonblocking(&self, fd: RawFd) -> io::Result<()> {
        // SAFETY: No safety requirements beyond passing valid arguments.
        let flags = check(unsafe { libc::fcntl(fd, libc::F_GETFL) })?;

        // SAFETY: No safety requirements beyond passing valid arguments.
        check(unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) })?;

        Ok(())
    }

    fn read(&self, fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
        retry_interrupted(|| {
            // SAFETY: The buffer is valid for writing `buf.len()` bytes.
            unsafe { libc::read(fd, buf.as_mut_ptr().cast::<c_void>(), buf.len()) }
        })
    }

    fn write(&self, fd: RawFd, buf: &[u8]) -> io::Result<usize> {
        retry_interrupted(|| {
            // SAFETY: The buffer is valid for reading `buf.len()` bytes.
            unsafe { libc::write(fd, buf.as_ptr().cast::<c_void>(), buf.len()) }
        })
    }

    fn poll(&self, fds: &mut [pollfd], timeout_ms: i32) -> io::Result<usize> {
        let count = nfds_t::try_from(fds.len())
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;

        retry_interrupted(|| {
            // SAFETY: The slice is valid for reading and writing `count` pollfd structures.
            let result = unsafe { libc::poll(fds.as_mut_ptr(), count, timeout_ms) };
            isize::try_from(result).unwrap_or(-1)
        })
    }

    fn close(&self, fd: RawFd) {
        // Errors from close() are not actionable; the descriptor is gone either way.
        // SAFETY: The caller owns the descriptor and never uses it again.
        unsafe {
            libc::close(fd);
        }
    }
}
