#![cfg_attr(coverage_nightly, coverage(off))]

use std::fmt::{self, Debug};
use std::io;
use std::os::fd::RawFd;
#[cfg(test)]
use std::sync::Arc;

use libc::pollfd;

#[cfg(test)]
use crate::pal::MockBindings;
use crate::pal::{Bindings, BuildTargetBindings};

/// Enum to hide the real/mock choice behind a single wrapper type.
#[derive(Clone)]
pub(crate) enum BindingsFacade {
    Target(&'static BuildTargetBindings),

    #[cfg(test)]
    Mock(Arc<MockBindings>),
}

impl BindingsFacade {
    pub(crate) const fn target() -> Self {
        Self::Target(&BuildTargetBindings)
    }

    #[cfg(test)]
    pub(crate) fn from_mock(mock: MockBindings) -> Self {
        Self::Mock(Arc::new(mock))
    }
}

impl Bindings for BindingsFacade {
    fn eventfd(&self) -> io::Result<RawFd> {
        match self {
            Self::Target(bindings) => bindings.eventfd(),
            #[cfg(test)]
            Self::Mock(mock) => mock.eventfd(),
        }
    }

    fn pipe(&self) -> io::Result<[RawFd; 2]> {
        match self {
            Self::Target(bindings) => bindings.pipe(),
            #[cfg(test)]
            Self::Mock(mock) => mock.pipe(),
        }
    }

    fn set_nonblocking(&self, fd: RawFd) -> io::Result<()> {
        match self {
            Self::Target(bindings) => bindings.set_nonblocking(fd),
            #[cfg(test)]
            Self::Mock(mock) => mock.set_nonblocking(fd),
        }
    }

    fn read(&self, fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Target(bindings) => bindings.read(fd, buf),
            #[cfg(test)]
            Self::Mock(mock) => mock.read(fd, buf),
        }
    }

    fn write(&self, fd: RawFd, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Target(bindings) => bindings.write(fd, buf),
            #[cfg(test)]
            Self::Mock(mock) => mock.write(fd, buf),
        }
    }

    fn poll(&self, fds: &mut [pollfd], timeout_ms: i32) -> io::Result<usize> {
        match self {
            Self::Target(bindings) => bindings.poll(fds, timeout_ms),
            #[cfg(test)]
            Self::Mock(mock) => mock.poll(fds, timeout_ms),
        }
    }

    fn close(&self, fd: RawFd) {
        match self {
            Self::Target(bindings) => bindings.close(fd),
            #[cfg(test)]
            Self::Mock(mock) => mock.close(fd),
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))] // No API contract to test.
impl Debug for BindingsFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target(inner) => inner.fmt(f),
            #[cfg(test)]
            Self::Mock(inner) => inner.fmt(f),
        }
    }
}
