//! [`Transport`] backed by [`reqwest`].

use async_trait::async_trait;
use futures_util::{TryStreamExt, stream::MapErr};
use http_body_util::BodyDataStream;
use reqwest::{Body, Client, header::CONTENT_TYPE};
use tracing::debug;

use crate::{
    config::SessionConfig,
    constants::EVENT_STREAM_MIME,
    errors::{ReqwestTransportError, SessionError},
    session::Session,
    transport::{Transport, TransportRequest},
};

type BodyStream =
    MapErr<BodyDataStream<Body>, fn(reqwest::Error) -> ReqwestTransportError>;

/// Opens event streams with a [`reqwest::Client`].
///
/// Anything but a 2xx `text/event-stream` response counts as a failed connect.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl From<Client> for ReqwestTransport {
    fn from(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    type Body = BodyStream;
    type Error = ReqwestTransportError;

    async fn open(&self, request: &TransportRequest) -> Result<Self::Body, Self::Error> {
        let mut builder = self
            .client
            .get(request.url.clone())
            .headers(request.headers.clone());
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReqwestTransportError::Status(status));
        }
        if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
            let content_type = content_type.to_str().unwrap_or_default();
            if !content_type.contains(EVENT_STREAM_MIME) {
                return Err(ReqwestTransportError::ContentType(content_type.to_owned()));
            }
        }
        debug!(url = %request.url, %status, "sse response accepted");

        Ok(BodyDataStream::new(Body::from(response))
            .map_err(ReqwestTransportError::from as fn(reqwest::Error) -> ReqwestTransportError))
    }
}

impl Session<ReqwestTransport> {
    /// Connects with a default [`reqwest::Client`]
    ///
    /// # Errors
    ///
    /// See [`Session::establish`].
    pub async fn connect_reqwest(config: SessionConfig) -> Result<Self, SessionError> {
        Self::establish(config, ReqwestTransport::new()).await
    }
}
