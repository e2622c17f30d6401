use std::any::Any;
use std::fmt;
use std::time::Duration;

/// Variant-specific data carried by an [`Event`][crate::Event].
///
/// The queues never look inside a payload. It is dropped together with the last handle to the
/// event that carries it, on whichever thread releases that handle.
#[derive(Default)]
#[non_exhaustive]
pub enum Payload {
    /// The event carries no data beyond its kind.
    #[default]
    None,

    /// A human-readable error message.
    Error(String),

    /// Playback position within a stream of the given length.
    Position {
        /// Time already played.
        position: Duration,

        /// Total length of the stream, or zero if unknown.
        length: Duration,
    },

    /// Textual metadata describing the current stream.
    Metadata(Metadata),

    /// Free-form text, such as the location of a stream to open.
    Text(String),

    /// Seek target as a fraction of the stream length, in `0.0..=1.0`.
    Seek(f64),

    /// Volume level in `0.0..=1.0`.
    Volume(f32),

    /// Application-defined data. Retrieve it with [`Payload::downcast_ref()`].
    Custom(Box<dyn Any + Send + Sync>),
}

impl Payload {
    /// Returns the custom payload as `T` if this is a [`Payload::Custom`] holding a `T`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use event_relay::Payload;
    ///
    /// let payload = Payload::Custom(Box::new(42_u64));
    ///
    /// assert_eq!(payload.downcast_ref::<u64>(), Some(&42));
    /// assert_eq!(payload.downcast_ref::<u32>(), None);
    /// ```
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Whether the event carries no data.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Error(message) => f.debug_tuple("Error").field(message).finish(),
            Self::Position { position, length } => f
                .debug_struct("Position")
                .field("position", position)
                .field("length", length)
                .finish(),
            Self::Metadata(metadata) => f.debug_tuple("Metadata").field(metadata).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Seek(target) => f.debug_tuple("Seek").field(target).finish(),
            Self::Volume(level) => f.debug_tuple("Volume").field(level).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Textual metadata published for a stream.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct Metadata {
    /// Title of the track.
    pub title: String,

    /// Performing artist.
    pub artist: String,

    /// Album the track belongs to.
    pub album: String,
}

impl Metadata {
    /// Creates a metadata record from its fields.
    #[must_use]
    pub fn new(title: impl Into<String>, artist: impl Into<String>, album: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
        }
    }
}
