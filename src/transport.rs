//! The HTTP side of a [`Session`][crate::Session].
//!
//! A [`Transport`] only has to open a GET request and hand back the response
//! body as a stream of byte chunks. Dropping the body closes the connection.

use core::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;
use http::HeaderMap;
use url::Url;

/// Everything a transport needs to open one stream
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: Url,
    /// Caller headers merged with `Accept`, `Cache-Control` and `Last-Event-ID`
    pub headers: HeaderMap,
    /// Passed through untouched from the session config
    pub timeout: Option<Duration>,
}

/// Opens event streams
#[async_trait]
pub trait Transport: Send + Sync {
    /// Response body, ends with `None` when the server closes the stream
    type Body: Stream<Item = Result<Bytes, Self::Error>> + Send + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn open(&self, request: &TransportRequest) -> Result<Self::Body, Self::Error>;
}

#[cfg(test)]
pub(crate) mod mock {
    use std::{
        collections::VecDeque,
        io,
        sync::{Arc, Mutex},
    };

    use futures::{StreamExt, stream::BoxStream};
    use tokio::time::Instant;

    use super::*;

    /// What the next call to `open` does
    pub(crate) enum Script {
        /// Serve these chunks then end the stream
        Body(Vec<Result<Bytes, io::Error>>),
        /// Serve these chunks then never produce anything again
        Hang(Vec<Result<Bytes, io::Error>>),
        /// Fail to connect
        Refuse,
    }

    impl Script {
        pub(crate) fn body(chunks: &[&'static str]) -> Self {
            Script::Body(Self::chunks(chunks))
        }

        pub(crate) fn hang(chunks: &[&'static str]) -> Self {
            Script::Hang(Self::chunks(chunks))
        }

        fn chunks(chunks: &[&'static str]) -> Vec<Result<Bytes, io::Error>> {
            chunks
                .iter()
                .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes())))
                .collect()
        }
    }

    #[derive(Default)]
    struct MockState {
        scripts: VecDeque<Script>,
        requests: Vec<(TransportRequest, Instant)>,
    }

    /// Scripted in-memory transport, runs out of scripts by refusing
    #[derive(Clone, Default)]
    pub(crate) struct MockTransport {
        state: Arc<Mutex<MockState>>,
    }

    impl MockTransport {
        pub(crate) fn new(scripts: impl IntoIterator<Item = Script>) -> Self {
            let state = MockState {
                scripts: scripts.into_iter().collect(),
                requests: Vec::new(),
            };
            Self {
                state: Arc::new(Mutex::new(state)),
            }
        }

        pub(crate) fn requests(&self) -> Vec<TransportRequest> {
            let state = self.state.lock().unwrap();
            state.requests.iter().map(|(req, _)| req.clone()).collect()
        }

        pub(crate) fn open_times(&self) -> Vec<Instant> {
            let state = self.state.lock().unwrap();
            state.requests.iter().map(|(_, at)| *at).collect()
        }

        /// `Last-Event-ID` sent with every request so far
        pub(crate) fn last_event_ids(&self) -> Vec<Option<String>> {
            self.requests()
                .iter()
                .map(|req| {
                    req.headers
                        .get("last-event-id")
                        .map(|v| v.to_str().unwrap().to_owned())
                })
                .collect()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        type Body = BoxStream<'static, Result<Bytes, io::Error>>;
        type Error = io::Error;

        async fn open(&self, request: &TransportRequest) -> Result<Self::Body, Self::Error> {
            let script = {
                let mut state = self.state.lock().unwrap();
                state.requests.push((request.clone(), Instant::now()));
                state.scripts.pop_front()
            };

            match script {
                Some(Script::Body(chunks)) => Ok(futures::stream::iter(chunks).boxed()),
                Some(Script::Hang(chunks)) => Ok(futures::stream::iter(chunks)
                    .chain(futures::stream::pending())
                    .boxed()),
                Some(Script::Refuse) | None => Err(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )),
            }
        }
    }
}
