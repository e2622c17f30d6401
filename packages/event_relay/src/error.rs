use std::io;

use thiserror::Error;

/// Errors that can occur when creating or operating queues, signals and channels.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The operating system refused to create a wake primitive, pipe or semaphore.
    ///
    /// The queue or channel being constructed is unusable and has been discarded.
    #[error("unable to create {resource}: {source}")]
    ResourceExhausted {
        /// The kind of resource that could not be created.
        resource: &'static str,

        /// The underlying operating system error.
        source: io::Error,
    },

    /// A frame on a cross-thread channel was only partially written or read.
    ///
    /// The channel is broken afterwards and every further use fails with
    /// [`Error::ChannelBroken`].
    #[error("cross-thread channel protocol violation: {problem}")]
    ProtocolViolation {
        /// A human-readable description of the problem.
        problem: String,
    },

    /// The channel suffered a protocol violation earlier and can no longer be used.
    #[error("cross-thread channel is broken by an earlier protocol violation")]
    ChannelBroken,

    /// The channel has been torn down and no longer carries frames.
    #[error("cross-thread channel has been torn down")]
    ChannelClosed,

    /// An operating system call failed while posting, signaling or waiting.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn resource(resource: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::ResourceExhausted { resource, source }
    }

    pub(crate) fn protocol(problem: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            problem: problem.into(),
        }
    }
}

/// A specialized `Result` type for event relay operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn resource_error_names_the_resource() {
        let error = Error::resource("wake signal")(io::Error::from(io::ErrorKind::OutOfMemory));

        assert!(matches!(
            error,
            Error::ResourceExhausted {
                resource: "wake signal",
                ..
            }
        ));
        assert!(error.to_string().starts_with("unable to create wake signal"));
    }

    #[test]
    fn io_error_converts() {
        let error: Error = io::Error::from(io::ErrorKind::BrokenPipe).into();

        assert!(matches!(error, Error::Io(_)));
    }
}
