mod handle;
mod pipe;
mod poller;
mod signal;

use handle::*;
pub(crate) use pipe::*;
pub(crate) use poller::*;
pub(crate) use signal::*;
