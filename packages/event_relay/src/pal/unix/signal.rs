use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

use tracing::debug;

use crate::pal::{Bindings, BindingsFacade, wait_readable};

#[derive(Debug)]
enum SignalFds {
    // A single eventfd serves as both the read and the write end.
    EventFd(RawFd),

    Pipe { read: RawFd, write: RawFd },
}

/// Level-triggered wake primitive: readable while set, unreadable once cleared.
///
/// Uses an eventfd where the platform has one and falls back to a non-blocking pipe otherwise.
#[derive(Debug)]
pub(crate) struct PlatformSignal {
    fds: SignalFds,
    bindings: BindingsFacade,
}

impl PlatformSignal {
    pub(crate) fn new() -> io::Result<Self> {
        Self::with_bindings(BindingsFacade::target())
    }

    pub(crate) fn with_bindings(bindings: BindingsFacade) -> io::Result<Self> {
        let fds = match bindings.eventfd() {
            Ok(fd) => SignalFds::EventFd(fd),
            Err(error) if error.kind() == io::ErrorKind::Unsupported => {
                debug!("eventfd is not available, falling back to a pipe for the wake signal");
                Self::open_pipe(&bindings)?
            }
            Err(error) => return Err(error),
        };

        Ok(Self { fds, bindings })
    }

    fn open_pipe(bindings: &BindingsFacade) -> io::Result<SignalFds> {
        let [read, write] = bindings.pipe()?;

        let nonblocking = bindings
            .set_nonblocking(read)
            .and_then(|()| bindings.set_nonblocking(write));

        if let Err(error) = nonblocking {
            bindings.close(read);
            bindings.close(write);
            return Err(error);
        }

        Ok(SignalFds::Pipe { read, write })
    }

    pub(crate) fn set(&self) -> io::Result<()> {
        let result = match self.fds {
            SignalFds::EventFd(fd) => self.bindings.write(fd, &1_u64.to_ne_bytes()),
            SignalFds::Pipe { write, .. } => self.bindings.write(write, &[1]),
        };

        match result {
            Ok(_) => Ok(()),
            // Counter saturated or pipe full: the signal is already readable.
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(error) => Err(error),
        }
    }

    pub(crate) fn clear(&self) {
        let mut buffer = [0_u8; 64];

        loop {
            // An eventfd read needs at least 8 bytes and resets the counter in one go.
            match self.bindings.read(self.read_fd(), &mut buffer) {
                Ok(0) | Err(_) => return,
                Ok(_) if matches!(self.fds, SignalFds::EventFd(_)) => return,
                Ok(_) => {}
            }
        }
    }

    pub(crate) fn wait(&self, timeout: Option<Duration>) -> io::Result<bool> {
        wait_readable(&self.bindings, self.read_fd(), timeout)
    }

    pub(crate) fn wait_handle(&self) -> RawFd {
        self.read_fd()
    }

    fn read_fd(&self) -> RawFd {
        match self.fds {
            SignalFds::EventFd(fd) => fd,
            SignalFds::Pipe { read, .. } => read,
        }
    }
}

impl Drop for PlatformSignal {
    fn drop(&mut self) {
        match self.fds {
            SignalFds::EventFd(fd) => self.bindings.close(fd),
            SignalFds::Pipe { read, write } => {
                self.bindings.close(read);
                self.bindings.close(write);
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::pal::MockBindings;

    #[test]
    fn eventfd_failure_is_reported() {
        let mut bindings = MockBindings::new();

        bindings
            .expect_eventfd()
            .times(1)
            .returning(|| Err(io::Error::from_raw_os_error(libc::EMFILE)));
        bindings.expect_pipe().never();

        let result = PlatformSignal::with_bindings(BindingsFacade::from_mock(bindings));

        assert_eq!(result.unwrap_err().raw_os_error(), Some(libc::EMFILE));
    }

    #[test]
    fn falls_back_to_pipe_without_eventfd() {
        let mut bindings = MockBindings::new();

        bindings
            .expect_eventfd()
            .returning(|| Err(io::ErrorKind::Unsupported.into()));
        bindings.expect_pipe().times(1).returning(|| Ok([10, 11]));
        bindings
            .expect_set_nonblocking()
            .times(2)
            .returning(|_| Ok(()));
        bindings
            .expect_write()
            .withf(|fd, buf| *fd == 11 && buf == &[1_u8][..])
            .times(1)
            .returning(|_, _| Ok(1));
        bindings.expect_close().with(eq(10)).times(1).return_const(());
        bindings.expect_close().with(eq(11)).times(1).return_const(());

        let signal = PlatformSignal::with_bindings(BindingsFacade::from_mock(bindings)).unwrap();

        assert_eq!(signal.wait_handle(), 10);
        signal.set().unwrap();
    }

    #[test]
    fn pipe_is_closed_if_it_cannot_be_made_nonblocking() {
        let mut bindings = MockBindings::new();

        bindings
            .expect_eventfd()
            .returning(|| Err(io::ErrorKind::Unsupported.into()));
        bindings.expect_pipe().returning(|| Ok([10, 11]));
        bindings
            .expect_set_nonblocking()
            .returning(|_| Err(io::Error::from_raw_os_error(libc::EBADF)));
        bindings.expect_close().times(2).return_const(());

        assert!(PlatformSignal::with_bindings(BindingsFacade::from_mock(bindings)).is_err());
    }

    #[test]
    fn saturated_signal_is_still_set() {
        let mut bindings = MockBindings::new();

        bindings.expect_eventfd().returning(|| Ok(7));
        bindings
            .expect_write()
            .returning(|_, _| Err(io::ErrorKind::WouldBlock.into()));
        bindings.expect_close().with(eq(7)).times(1).return_const(());

        let signal = PlatformSignal::with_bindings(BindingsFacade::from_mock(bindings)).unwrap();

        signal.set().unwrap();
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call FFI functions")]
    fn real_signal_is_level_triggered() {
        let signal = PlatformSignal::new().unwrap();

        assert!(!signal.wait(Some(Duration::ZERO)).unwrap());

        signal.set().unwrap();
        signal.set().unwrap();
        assert!(signal.wait(Some(Duration::ZERO)).unwrap());
        assert!(signal.wait(Some(Duration::ZERO)).unwrap());

        signal.clear();
        assert!(!signal.wait(Some(Duration::ZERO)).unwrap());
    }
}
