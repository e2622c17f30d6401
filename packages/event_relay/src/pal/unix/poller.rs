use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

use libc::{POLLERR, POLLHUP, POLLIN, pollfd};

use crate::pal::{Bindings, BindingsFacade};

const READY_EVENTS: i16 = POLLIN | POLLHUP | POLLERR;

/// Converts a timeout to the millisecond form `poll()` expects, rounding up so that a short
/// non-zero timeout does not turn into a busy poll. `None` means wait forever.
pub(crate) fn timeout_ms(timeout: Option<Duration>) -> i32 {
    match timeout {
        None => -1,
        Some(timeout) => {
            let millis = timeout.as_nanos().div_ceil(1_000_000);
            i32::try_from(millis).unwrap_or(i32::MAX)
        }
    }
}

/// Waits until `fd` is readable or the timeout elapses. Returns whether it became readable.
pub(crate) fn wait_readable(
    bindings: &BindingsFacade,
    fd: RawFd,
    timeout: Option<Duration>,
) -> io::Result<bool> {
    let mut fds = [pollfd {
        fd,
        events: POLLIN,
        revents: 0,
    }];

    let ready = bindings.poll(&mut fds, timeout_ms(timeout))?;

    Ok(ready > 0 && fds.iter().any(|entry| entry.revents & READY_EVENTS != 0))
}

/// Waits for readiness on a set of descriptors at once.
#[derive(Debug)]
pub(crate) struct PlatformPoller {
    bindings: BindingsFacade,
}

impl PlatformPoller {
    pub(crate) fn new() -> Self {
        Self::with_bindings(BindingsFacade::target())
    }

    pub(crate) fn with_bindings(bindings: BindingsFacade) -> Self {
        Self { bindings }
    }

    /// Returns the positions in `handles` that are ready, in ascending order.
    ///
    /// An empty result means the timeout elapsed.
    pub(crate) fn wait(
        &self,
        handles: &[RawFd],
        timeout: Option<Duration>,
    ) -> io::Result<Vec<usize>> {
        let mut fds = handles
            .iter()
            .map(|&fd| pollfd {
                fd,
                events: POLLIN,
                revents: 0,
            })
            .collect::<Vec<_>>();

        let ready = self.bindings.poll(&mut fds, timeout_ms(timeout))?;

        if ready == 0 {
            return Ok(Vec::new());
        }

        Ok(fds
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.revents & READY_EVENTS != 0)
            .map(|(index, _)| index)
            .collect())
    }
}
