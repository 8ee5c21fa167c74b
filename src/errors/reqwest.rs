use reqwest::StatusCode;
use thiserror::Error;

/// Failure to open a stream through [`ReqwestTransport`][crate::reqwest::ReqwestTransport]
#[derive(Debug, Error)]
pub enum ReqwestTransportError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("server responded with status {0}")]
    Status(StatusCode),

    /// The server answered with something other than `text/event-stream`
    #[error("unexpected content type {0:?}")]
    ContentType(String),
}

impl ReqwestTransportError {
    /// `true` if the server answered but refused the stream
    pub fn is_response_err(&self) -> bool {
        matches!(self, Self::Status(_) | Self::ContentType(_))
    }
}
