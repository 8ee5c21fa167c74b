//! [`Error`][std::error::Error] types used across the crate

use encoding_rs::Encoding;
use thiserror::Error;

#[cfg(feature = "reqwest")]
pub mod reqwest;
#[cfg(feature = "reqwest")]
pub use self::reqwest::ReqwestTransportError;

/// Type-erased error coming out of a transport or an event handler
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The byte stream contained a sequence that is invalid in the configured
/// encoding. Unlike an incomplete sequence this can never recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("stream contained an invalid {} byte sequence", .encoding.name())]
pub struct DecodeError {
    encoding: &'static Encoding,
}

impl DecodeError {
    pub(crate) fn new(encoding: &'static Encoding) -> Self {
        Self { encoding }
    }

    /// Name of the encoding that rejected the input
    pub fn encoding(&self) -> &'static str {
        self.encoding.name()
    }
}

/// Error from [`FrameDecoder::next_frame`][crate::frame::FrameDecoder::next_frame]
#[derive(Debug, Error)]
pub enum FrameError<E> {
    /// Reading from the byte source failed
    #[error("transport error: {0}")]
    Transport(E),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Errors surfaced by a [`Session`][crate::Session]
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The last seen event id cannot be sent as a header value
    #[error("last event id {0:?} is not a valid header value")]
    InvalidLastEventId(String),

    /// Opening or re-opening the stream failed
    #[error("could not connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The push mode handler returned an error
    #[error("event handler failed: {0}")]
    Handler(#[source] BoxError),

    /// The session lost its stream and must be connected again
    #[error("session is not connected")]
    NotConnected,

    /// The session was closed and cannot be used anymore
    #[error("session is closed")]
    Closed,

    /// The spawned push loop panicked or was aborted
    #[error("push loop task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SessionError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// `true` when the stream could not be (re)established
    pub fn is_connect_err(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }
}
