//! Session configuration.

use core::time::Duration;

use encoding_rs::{Encoding, UTF_8};
use http::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::{constants::DEFAULT_RETRY, errors::SessionError};

/// Configuration for a [`Session`][crate::Session].
///
/// Built with [`SessionConfig::new`] and chainable setters, everything but the
/// URL has a default.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Event stream URL.
    pub url: String,
    /// Resumption id to send on the first connect.
    pub last_event_id: Option<String>,
    /// Delay before reconnecting until the server advises another one.
    pub retry: Duration,
    /// Text encoding of the stream.
    pub encoding: &'static Encoding,
    /// Extra headers sent with every request.
    pub headers: HeaderMap,
    /// Request timeout handed to the transport as is.
    pub timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            last_event_id: None,
            retry: DEFAULT_RETRY,
            encoding: UTF_8,
            headers: HeaderMap::new(),
            timeout: None,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn last_event_id(mut self, id: impl Into<String>) -> Self {
        self.last_event_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn retry(mut self, retry: Duration) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the encoding from a WHATWG label such as `"latin1"` or `"utf-16le"`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConfig`] for an unknown label.
    pub fn encoding_label(self, label: &str) -> Result<Self, SessionError> {
        let encoding = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| SessionError::config(format!("unknown encoding label {label:?}")))?;
        Ok(self.encoding(encoding))
    }

    /// Replace the extra headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Add one extra header.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validate the configuration and parse its URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is empty or cannot be parsed.
    pub fn validate(&self) -> Result<Url, SessionError> {
        if self.url.is_empty() {
            return Err(SessionError::config("URL cannot be empty"));
        }
        Ok(Url::parse(&self.url)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert!(config.url.is_empty());
        assert!(config.last_event_id.is_none());
        assert_eq!(config.retry, Duration::from_millis(3000));
        assert_eq!(config.encoding, UTF_8);
        assert!(config.headers.is_empty());
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let config = SessionConfig::new("https://example.com/events")
            .last_event_id("42")
            .retry(Duration::from_millis(500))
            .header(
                HeaderName::from_static("x-api-key"),
                HeaderValue::from_static("secret"),
            )
            .timeout(Duration::from_secs(30));

        assert_eq!(config.url, "https://example.com/events");
        assert_eq!(config.last_event_id.as_deref(), Some("42"));
        assert_eq!(config.retry, Duration::from_millis(500));
        assert_eq!(
            config.headers.get("x-api-key").map(|v| v.to_str().unwrap()),
            Some("secret")
        );
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_encoding_label() {
        let config = SessionConfig::new("https://example.com")
            .encoding_label("utf-16le")
            .unwrap();
        assert_eq!(config.encoding, encoding_rs::UTF_16LE);

        let err = SessionConfig::new("https://example.com")
            .encoding_label("klingon")
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidConfig { .. }));
    }

    #[test]
    fn test_validation() {
        let err = SessionConfig::default().validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid configuration: URL cannot be empty");

        let err = SessionConfig::new("not a url").validate().unwrap_err();
        assert!(matches!(err, SessionError::InvalidUrl(_)));

        let url = SessionConfig::new("http://localhost:8080/stream")
            .validate()
            .unwrap();
        assert_eq!(url.path(), "/stream");
    }
}
