//! Error types shared by the stream engine and codec implementations.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::Arc;

use crate::config::ConfigError;
use crate::state::Mode;

/// Failure reported by a codec.
///
/// The value is reference counted so the stream can keep it in its
/// [`ErrorSlot`] while also handing it to the caller.
#[derive(Clone)]
pub struct CodecError {
    inner: Arc<dyn StdError + Send + Sync>,
}

impl CodecError {
    /// Wraps an arbitrary error value.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(error),
        }
    }

    /// Creates an error carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    /// Returns the wrapped error when it has type `E`.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.inner.downcast_ref::<E>()
    }
}

impl fmt::Debug for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner, f)
    }
}

impl StdError for CodecError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source()
    }
}

impl From<io::Error> for CodecError {
    fn from(error: io::Error) -> Self {
        Self::new(error)
    }
}

#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for Message {}

/// One-shot container a codec fills before returning [`Status::Error`](crate::Status::Error).
///
/// The first error stored wins. Once set, the slot keeps its value for the
/// lifetime of the owning stream.
#[derive(Clone, Debug, Default)]
pub struct ErrorSlot {
    error: Option<CodecError>,
}

impl ErrorSlot {
    /// Creates an empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self { error: None }
    }

    /// Stores `error` unless a value is already present.
    pub fn set(&mut self, error: impl Into<CodecError>) {
        debug_assert!(self.error.is_none(), "error slot written twice");
        if self.error.is_none() {
            self.error = Some(error.into());
        }
    }

    /// Reports whether an error has been stored.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.error.is_some()
    }

    /// Returns the stored error, if any.
    #[must_use]
    pub const fn get(&self) -> Option<&CodecError> {
        self.error.as_ref()
    }

    pub(crate) fn get_or_insert_unknown(&mut self) -> CodecError {
        self.error
            .get_or_insert_with(|| CodecError::msg("codec reported a failure without an error"))
            .clone()
    }
}

impl From<String> for CodecError {
    fn from(message: String) -> Self {
        Self::msg(message)
    }
}

impl From<&str> for CodecError {
    fn from(message: &str) -> Self {
        Self::msg(message)
    }
}

/// Errors surfaced by transcoding streams.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The operation is not legal in the stream's current mode.
    #[error("cannot {operation} a stream in {mode} mode")]
    Protocol {
        /// Name of the rejected operation.
        operation: &'static str,
        /// Mode the stream was in.
        mode: Mode,
    },

    /// The state machine was asked for a transition it does not define.
    #[error("cannot change stream mode from {from} to {to}")]
    InvalidTransition {
        /// Mode before the attempted transition.
        from: Mode,
        /// Requested mode.
        to: Mode,
    },

    /// The stream was poisoned by an earlier codec failure.
    #[error("stream is broken by an earlier codec failure: {0}")]
    Broken(#[source] CodecError),

    /// The codec failed while starting or processing data.
    #[error("codec failed: {0}")]
    Codec(#[source] CodecError),

    /// The codec failed to initialize; the stream was never created.
    #[error("codec initialization failed: {0}")]
    Initialize(#[source] CodecError),

    /// The codec failed while being finalized; buffered data may be lost.
    #[error("codec finalization failed: {0}")]
    Finalize(#[source] CodecError),

    /// The codec stopped making progress although it had room to do so.
    #[error("codec made no progress while {mode}")]
    Stalled {
        /// Mode in which the codec stalled.
        mode: Mode,
    },

    /// The wrapped resource was already closed.
    #[error("underlying resource is closed")]
    ResourceClosed,

    /// The stream configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The wrapped resource failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Reports whether the error signals misuse of the stream rather than a runtime fault.
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(
            self,
            Self::Protocol { .. } | Self::InvalidTransition { .. } | Self::Broken(_)
        )
    }

    /// Returns the codec error carried by this error, if any.
    #[must_use]
    pub const fn codec_error(&self) -> Option<&CodecError> {
        match self {
            Self::Broken(error)
            | Self::Codec(error)
            | Self::Initialize(error)
            | Self::Finalize(error) => Some(error),
            _ => None,
        }
    }

    /// Recovers a stream error that was wrapped for the [`std::io`] traits.
    #[must_use]
    pub fn from_io(error: &io::Error) -> Option<&Self> {
        error.get_ref().and_then(|inner| inner.downcast_ref::<Self>())
    }
}

impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Io(error) => error,
            Error::Protocol { .. } | Error::InvalidTransition { .. } | Error::Broken(_) => {
                Self::new(io::ErrorKind::InvalidInput, error)
            }
            Error::Codec(_) | Error::Stalled { .. } => Self::new(io::ErrorKind::InvalidData, error),
            other => Self::other(other),
        }
    }
}
