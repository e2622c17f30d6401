mod bindings;
mod pipe;
mod poller;
mod signal;

pub(crate) use bindings::*;
pub(crate) use pipe::*;
pub(crate) use poller::*;
pub(crate) use signal::*;
