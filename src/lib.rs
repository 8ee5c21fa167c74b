//! A reconnecting client for
//! [Server-Sent Events](https://html.spec.whatwg.org/multipage/server-sent-events.html) (SSE) streams.
//!
//! `sse_session` turns a long-lived HTTP response body into a sequence of
//! [`Event`]s and keeps that sequence going across dropped connections:
//!
//! - [`Session`] - owns the connection. When the stream ends it discards the
//!   partial frame it was holding, sleeps for the retry interval (3s unless
//!   the server sends a `retry` field) and reconnects with a `Last-Event-ID`
//!   header.
//! - [`FrameDecoder`][frame::FrameDecoder] - incremental decoding of a byte
//!   stream in UTF-8 or any other [`encoding_rs`] encoding, split into
//!   blank-line delimited frames. Characters split across reads are held until
//!   they complete.
//! - [`Event::parse`] - turns one frame into an [`Event`]. Malformed lines are
//!   skipped and reported to a per-session [`DiagnosticSink`].
//! - [`Transport`] - the HTTP side, implemented for [`reqwest`][::reqwest] by
//!   [`ReqwestTransport`] behind the `reqwest` feature.
//!
//! # Pulling events
//!
//! ```ignore
//! use sse_session::{Session, SessionConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SessionConfig::new("https://example.com/events");
//! let mut session = Session::connect_reqwest(config).await?;
//!
//! while let Some(event) = session.next_event().await? {
//!     println!("{}: {}", event.event, event.data);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! `next_event` only fails for problems the session cannot recover from by
//! itself: a reconnect that could not be established, or bytes that are not
//! valid in the configured encoding. It returns `Ok(None)` once the session
//! was closed through a [`CloseHandle`].
//!
//! # Pushing events to a handler
//!
//! ```ignore
//! use sse_session::{Event, Session, SessionConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::connect_reqwest(SessionConfig::new("https://example.com/events")).await?;
//!
//! let subscription = session.start(|event: Event| async move {
//!     println!("{}", event.data);
//!     Ok::<_, std::io::Error>(())
//! });
//!
//! // later
//! subscription.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Decoding frames yourself
//!
//! If you already have a byte stream and don't want reconnects you can use
//! the decoder directly:
//!
//! ```rust
//! use bytes::Bytes;
//! use sse_session::{Event, frame::{FrameDecoder, NextFrame}, diagnostics::TracingSink};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let chunks = vec![
//!     Ok::<_, std::io::Error>(Bytes::from("data: hello\n\ndata: wor")),
//!     Ok(Bytes::from("ld\n\n")),
//! ];
//! let mut source = futures::stream::iter(chunks);
//! let mut decoder = FrameDecoder::new(encoding_rs::UTF_8);
//!
//! while let Ok(NextFrame::Frame(frame)) = decoder.next_frame(&mut source).await {
//!     let event = Event::parse(&frame, &mut TracingSink);
//!     println!("{}", event.data);
//! }
//! # }
//! ```
//!
//! # Feature flags
//!
//! | Feature | Default | Description |
//! | --- | --- | --- |
//! | `reqwest` | off | Provides [`ReqwestTransport`] and [`Session::connect_reqwest`]. |
//! | `serde` | off | Derives `Serialize` and `Deserialize` on [`Event`] and enables `serde` support in [`bytes-utils`][bytes_utils]. |

pub(crate) mod constants;
pub mod config;
pub mod consumer;
pub mod diagnostics;
pub mod errors;
pub mod event;
pub mod frame;
#[cfg(feature = "reqwest")]
pub mod reqwest;
pub mod session;
pub(crate) mod text_decoder;
pub mod transport;

pub use config::SessionConfig;
pub use constants::{DEFAULT_EVENT_TYPE, DEFAULT_RETRY};
pub use consumer::{EventHandler, Subscription, SyncHandler, sync_handler};
pub use diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
pub use errors::{DecodeError, SessionError};
pub use event::Event;
pub use session::{CloseHandle, Session, SessionState};
pub use transport::{Transport, TransportRequest};

// if the reqwest feature is enabled, this is what someone wants
#[cfg(feature = "reqwest")]
pub use self::reqwest::ReqwestTransport;
#[cfg(feature = "reqwest")]
pub use errors::ReqwestTransportError;
