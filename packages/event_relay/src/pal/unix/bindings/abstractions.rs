#![cfg_attr(
    test,
    expect(
        clippy::struct_field_names,
        reason = "false positive from automock generated code"
    )
)]

use std::fmt::Debug;
use std::io;
use std::os::fd::RawFd;

use libc::pollfd;

/// Bindings for FFI calls into the operating system.
///
/// All PAL FFI calls must go through this trait, enabling them to be mocked.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Bindings: Debug + Send + Sync + 'static {
    // eventfd() with close-on-exec and non-blocking flags. Fails with `Unsupported` on
    // platforms without eventfd.
    fn eventfd(&self) -> io::Result<RawFd>;

    // pipe() with close-on-exec set on both ends. Returns [read end, write end].
    fn pipe(&self) -> io::Result<[RawFd; 2]>;

    fn set_nonblocking(&self, fd: RawFd) -> io::Result<()>;

    fn read(&self, fd: RawFd, buf: &mut [u8]) -> io::Result<usize>;

    fn write(&self, fd: RawFd, buf: &[u8]) -> io::Result<usize>;

    // poll() over the given descriptors. Returns the number of descriptors with events.
    fn poll(&self, fds: &mut [pollfd], timeout_ms: i32) -> io::Result<usize>;

    fn close(&self, fd: RawFd);
}
