//! The reconnecting session.
//!
//! A [`Session`] owns one transport connection at a time. When the stream
//! ends it throws away whatever partial frame it was holding, waits for the
//! retry interval and opens a new request carrying the last seen event id.
//! It only stops when closed or when a reconnect attempt fails.

use core::time::Duration;
use std::pin::Pin;

use bytes_utils::Str;
use http::{
    HeaderMap, HeaderName, HeaderValue,
    header::{ACCEPT, CACHE_CONTROL},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
    config::SessionConfig,
    constants::{EVENT_STREAM_MIME, LAST_EVENT_ID, NO_CACHE},
    diagnostics::{DiagnosticSink, TracingSink},
    errors::{FrameError, SessionError},
    event::{Event, owned_str},
    frame::{FrameDecoder, NextFrame},
    transport::{Transport, TransportRequest},
};

/// Where a [`Session`] is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Never connected, or the last connect attempt failed
    Disconnected,
    /// Waiting for the transport to open the stream
    Connecting,
    /// Reading events
    Connected,
    /// The stream ended, waiting out the retry interval
    Draining,
    /// Closed for good
    Closed,
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Clonable handle that closes a [`Session`] from anywhere.
///
/// Closing wakes up a pending [`Session::next_event`], which then returns
/// `Ok(None)` instead of an error.
#[derive(Debug, Clone)]
pub struct CloseHandle {
    token: CancellationToken,
}

impl CloseHandle {
    pub fn close(&self) {
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }
}

pub struct Session<T: Transport> {
    url: Url,
    transport: T,
    headers: HeaderMap,
    timeout: Option<Duration>,
    body: Option<Pin<Box<T::Body>>>,
    decoder: FrameDecoder,
    last_event_id: Option<Str>,
    retry: Duration,
    state: SessionState,
    shutdown: CancellationToken,
    diagnostics: Box<dyn DiagnosticSink>,
}

impl<T: Transport> Session<T> {
    /// Creates a disconnected session, call [`connect`](Session::connect) to start it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn new(config: SessionConfig, transport: T) -> Result<Self, SessionError> {
        let url = config.validate()?;
        let SessionConfig {
            last_event_id,
            retry,
            encoding,
            headers,
            timeout,
            ..
        } = config;

        Ok(Self {
            url,
            transport,
            headers,
            timeout,
            body: None,
            decoder: FrameDecoder::new(encoding),
            last_event_id: last_event_id.map(owned_str),
            retry,
            state: SessionState::Disconnected,
            shutdown: CancellationToken::new(),
            diagnostics: Box::new(TracingSink),
        })
    }

    /// Creates a session and connects it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the first connect fails.
    pub async fn establish(config: SessionConfig, transport: T) -> Result<Self, SessionError> {
        let mut session = Self::new(config, transport)?;
        session.connect().await?;
        Ok(session)
    }

    /// Sends malformed line reports to `sink` instead of the log
    #[must_use]
    pub fn with_diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Box::new(sink);
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Id that will be sent as `Last-Event-ID` on the next connect
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Delay before the next reconnect
    pub fn retry(&self) -> Duration {
        self.retry
    }

    /// Decoded text not yet returned as an event
    pub fn pending_text(&self) -> &str {
        self.decoder.pending_text()
    }

    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            token: self.shutdown.clone(),
        }
    }

    /// Closes the session and drops the connection
    pub fn close(&mut self) {
        self.shutdown.cancel();
        self.finish_close();
    }

    pub(crate) fn is_closing(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub(crate) fn finish_close(&mut self) {
        self.body = None;
        if !self.state.is_closed() {
            info!(url = %self.url, "sse session closed");
            self.state = SessionState::Closed;
        }
    }

    fn request(&self) -> Result<TransportRequest, SessionError> {
        let mut headers = self.headers.clone();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
        headers.insert(ACCEPT, HeaderValue::from_static(EVENT_STREAM_MIME));

        if let Some(id) = self.last_event_id.as_deref().filter(|id| !id.is_empty()) {
            let value = HeaderValue::from_str(id)
                .map_err(|_| SessionError::InvalidLastEventId(id.to_owned()))?;
            headers.insert(HeaderName::from_static(LAST_EVENT_ID), value);
        }

        Ok(TransportRequest {
            url: self.url.clone(),
            headers,
            timeout: self.timeout,
        })
    }

    /// Opens a new stream, replacing the current one.
    ///
    /// A failure is returned as is, it is never retried here.
    ///
    /// # Errors
    ///
    /// [`SessionError::Closed`] if the session was closed,
    /// [`SessionError::Connect`] if the transport could not open the stream.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        if self.state.is_closed() || self.is_closing() {
            self.finish_close();
            return Err(SessionError::Closed);
        }

        let request = self.request()?;
        self.state = SessionState::Connecting;
        info!(
            url = %self.url,
            last_event_id = ?self.last_event_id.as_deref(),
            "sse connecting"
        );

        let opened = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => None,
            opened = self.transport.open(&request) => Some(opened),
        };

        match opened {
            None => {
                self.finish_close();
                Err(SessionError::Closed)
            }
            Some(Ok(body)) => {
                self.decoder.discard_partial_frame();
                self.body = Some(Box::pin(body));
                self.state = SessionState::Connected;
                info!(url = %self.url, "sse connection established");
                Ok(())
            }
            Some(Err(e)) => {
                self.body = None;
                self.state = SessionState::Disconnected;
                error!(url = %self.url, error = %e, "sse connection failed");
                Err(SessionError::Connect {
                    url: self.url.to_string(),
                    source: Box::new(e),
                })
            }
        }
    }

    /// Waits for the next event, reconnecting as often as needed.
    ///
    /// Returns `Ok(None)` once the session is closed while waiting. Calling it
    /// again after that returns [`SessionError::Closed`].
    ///
    /// # Errors
    ///
    /// Fails if the session is not connected, if the stream holds bytes that
    /// are invalid in the configured encoding, or if a reconnect fails.
    pub async fn next_event(&mut self) -> Result<Option<Event>, SessionError> {
        loop {
            if self.state.is_closed() || self.is_closing() {
                self.finish_close();
                return Err(SessionError::Closed);
            }

            let Some(body) = self.body.as_mut() else {
                self.state = SessionState::Disconnected;
                return Err(SessionError::NotConnected);
            };

            let read = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => None,
                read = self.decoder.next_frame(body) => Some(read),
            };

            match read {
                None => {
                    debug!(url = %self.url, "close requested while reading");
                    self.finish_close();
                    return Ok(None);
                }
                Some(Ok(NextFrame::Frame(raw))) => return Ok(Some(self.dispatch(&raw))),
                Some(Ok(NextFrame::End)) => {
                    warn!(url = %self.url, "sse stream ended");
                }
                Some(Err(FrameError::Transport(e))) => {
                    if self.is_closing() {
                        self.finish_close();
                        return Ok(None);
                    }
                    warn!(url = %self.url, error = %e, "sse stream read failed");
                }
                Some(Err(FrameError::Decode(e))) => {
                    error!(url = %self.url, error = %e, "sse stream is not valid text");
                    self.body = None;
                    self.state = SessionState::Disconnected;
                    self.decoder.discard_partial_frame();
                    return Err(e.into());
                }
            }

            if !self.reconnect().await? {
                return Ok(None);
            }
        }
    }

    /// Drops the finished stream and opens a new one after the retry
    /// interval. `Ok(false)` means the session was closed in the meantime.
    async fn reconnect(&mut self) -> Result<bool, SessionError> {
        self.state = SessionState::Draining;
        self.body = None;

        let discarded = self.decoder.discard_partial_frame();
        if discarded > 0 {
            debug!(url = %self.url, discarded, "discarded partial sse frame");
        }

        info!(
            url = %self.url,
            delay_ms = self.retry.as_millis() as u64,
            "sse reconnecting after retry interval"
        );
        let slept = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => false,
            _ = tokio::time::sleep(self.retry) => true,
        };
        if !slept {
            self.finish_close();
            return Ok(false);
        }

        match self.connect().await {
            Ok(()) => Ok(true),
            Err(SessionError::Closed) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn dispatch(&mut self, raw: &str) -> Event {
        let event = Event::parse(raw, &mut *self.diagnostics);

        if let Some(retry) = event.retry {
            if retry != self.retry {
                debug!(
                    url = %self.url,
                    retry_ms = retry.as_millis() as u64,
                    "server changed retry interval"
                );
            }
            self.retry = retry;
        }
        if let Some(id) = &event.id {
            self.last_event_id = Some(id.clone());
        }
        event
    }
}
