use std::fmt;

/// Identifies which logical stream or session an event belongs to.
///
/// Pipelines that only ever play one stream at a time can use `0` throughout.
pub type StreamId = u32;

/// Tag identifying what an [`Event`][crate::Event] means and whether it is a control event.
///
/// Control events (abort, flush, quit and similar requests) must preempt ordinary processing.
/// Consumers detect them with [`ThreadQueue::check_preempt()`][crate::Queue::check_preempt]
/// or skip over them with [`pop_unless()`][crate::Queue::pop_unless].
///
/// Two kinds are equal only if both the code and the control flag match, so the same numeric
/// code may be reused for a data kind and a control kind.
///
/// # Example
///
/// ```rust
/// use event_relay::EventKind;
///
/// const DECODER_STATS: EventKind = EventKind::data(0x100);
///
/// assert!(!DECODER_STATS.is_control());
/// assert!(EventKind::QUIT.is_control());
/// ```
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct EventKind {
    code: u16,
    control: bool,
}

impl EventKind {
    /// Creates an ordinary data kind with the given code.
    #[must_use]
    pub const fn data(code: u16) -> Self {
        Self {
            code,
            control: false,
        }
    }

    /// Creates a control kind with the given code.
    #[must_use]
    pub const fn control(code: u16) -> Self {
        Self {
            code,
            control: true,
        }
    }

    /// The numeric code of the kind.
    #[must_use]
    pub const fn code(self) -> u16 {
        self.code
    }

    /// Whether events of this kind must preempt ordinary processing.
    #[must_use]
    pub const fn is_control(self) -> bool {
        self.control
    }

    /// A buffer of decoded or encoded media data.
    pub const BUFFER: Self = Self::data(1);
    /// The stream format changed and the consumer must reconfigure.
    pub const CONFIGURE: Self = Self::data(2);
    /// Textual metadata for the current stream.
    pub const META: Self = Self::data(3);
    /// The producer has no more data for the stream.
    pub const END: Self = Self::data(4);
    /// Playback of a new stream has begun.
    pub const BEGIN_OF_STREAM: Self = Self::data(5);
    /// Playback of the stream has ended.
    pub const END_OF_STREAM: Self = Self::data(6);
    /// The engine is idle and ready to open a stream.
    pub const STATE_READY: Self = Self::data(7);
    /// The engine is playing.
    pub const STATE_PLAYING: Self = Self::data(8);
    /// The engine is paused.
    pub const STATE_PAUSING: Self = Self::data(9);
    /// Periodic position and length update.
    pub const TIME_UPDATE: Self = Self::data(10);
    /// The output volume changed.
    pub const VOLUME_NOTIFY: Self = Self::data(11);
    /// Something went wrong; the payload carries the message.
    pub const ERROR: Self = Self::data(12);

    /// Close the current stream.
    pub const CLOSE: Self = Self::control(1);
    /// Open the stream named in the payload.
    pub const OPEN: Self = Self::control(2);
    /// Discard pending work, then open the stream named in the payload.
    pub const OPEN_FLUSH: Self = Self::control(3);
    /// Shut the worker down.
    pub const QUIT: Self = Self::control(4);
    /// Seek to the position in the payload.
    pub const SEEK: Self = Self::control(5);
    /// Toggle pause.
    pub const PAUSE: Self = Self::control(6);
    /// Change the output volume.
    pub const VOLUME: Self = Self::control(7);
    /// Discard everything buffered downstream.
    pub const FLUSH: Self = Self::control(8);
}

impl fmt::Debug for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.control {
            write!(f, "EventKind::control({})", self.code)
        } else {
            write!(f, "EventKind::data({})", self.code)
        }
    }
}
