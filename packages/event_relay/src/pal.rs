//! Platform Abstraction Layer (PAL). Wraps the operating system primitives used for waking
//! consumers: a level-triggered signal, a byte pipe and a readiness poller.

#[cfg(unix)]
use std::os::fd::RawFd;
#[cfg(windows)]
use std::os::windows::io::RawHandle;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub(crate) use unix::*;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub(crate) use windows::*;

/// Raw operating system handle that becomes readable when a consumer has work.
///
/// On Unix-like systems this is a file descriptor suitable for `poll()`.
#[cfg(unix)]
pub type WaitHandle = RawFd;

/// Raw operating system handle that becomes signaled when a consumer has work.
///
/// On Windows this is a waitable object handle suitable for `WaitForMultipleObjects()`.
#[cfg(windows)]
pub type WaitHandle = RawHandle;
