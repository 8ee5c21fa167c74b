//! Pull and push consumption of a [`Session`].
//!
//! Pull mode is [`Session::next_event`] or the [`Stream`] returned by
//! [`Session::into_stream`]. Push mode feeds every event to an
//! [`EventHandler`], either in place with [`Session::run`] or on a tokio task
//! with [`Session::start`].
//!
//! Both modes drive the same session state. `run` borrows the session mutably
//! and `start` takes it by value, so pulling by hand while a push loop is
//! running is not possible. Callers that share a session behind their own lock
//! must not do both at once.

use core::future::Future;

use async_trait::async_trait;
use futures_core::Stream;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{
    errors::{BoxError, SessionError},
    event::Event,
    session::{CloseHandle, Session},
    transport::Transport,
};

/// Receives events in push mode.
///
/// Handlers may suspend. A handler that never does simply completes right
/// away, see [`sync_handler`].
///
/// Any `FnMut(Event) -> impl Future<Output = Result<(), E>>` is a handler.
#[async_trait]
pub trait EventHandler: Send {
    async fn handle(&mut self, event: Event) -> Result<(), BoxError>;
}

#[async_trait]
impl<F, Fut, E> EventHandler for F
where
    F: FnMut(Event) -> Fut + Send,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<BoxError> + 'static,
{
    async fn handle(&mut self, event: Event) -> Result<(), BoxError> {
        (self)(event).await.map_err(Into::into)
    }
}

/// Handler made from a closure that does not suspend
#[derive(Debug, Clone)]
pub struct SyncHandler<F>(F);

pub fn sync_handler<F, E>(f: F) -> SyncHandler<F>
where
    F: FnMut(Event) -> Result<(), E> + Send,
    E: Into<BoxError>,
{
    SyncHandler(f)
}

#[async_trait]
impl<F, E> EventHandler for SyncHandler<F>
where
    F: FnMut(Event) -> Result<(), E> + Send,
    E: Into<BoxError> + 'static,
{
    async fn handle(&mut self, event: Event) -> Result<(), BoxError> {
        (self.0)(event).map_err(Into::into)
    }
}

impl<T: Transport> Session<T> {
    /// Feeds every event to `handler` until the session closes or fails.
    ///
    /// A handler error stops the loop and is returned, unless the session was
    /// already closing, in which case it is dropped and the loop ends cleanly.
    ///
    /// # Errors
    ///
    /// [`SessionError::Handler`] for a handler failure, otherwise whatever
    /// [`next_event`](Session::next_event) failed with.
    pub async fn run<H>(&mut self, handler: &mut H) -> Result<(), SessionError>
    where
        H: EventHandler + ?Sized,
    {
        loop {
            let event = match self.next_event().await {
                Ok(Some(event)) => event,
                Ok(None) => return Ok(()),
                Err(SessionError::Closed) if self.is_closing() => return Ok(()),
                Err(e) => return Err(e),
            };

            if let Err(e) = handler.handle(event).await {
                if self.is_closing() {
                    debug!(url = %self.url(), error = %e, "ignoring handler error during close");
                    self.finish_close();
                    return Ok(());
                }
                return Err(SessionError::Handler(e));
            }
        }
    }

    /// Runs the push loop on a new tokio task
    pub fn start<H>(self, mut handler: H) -> Subscription
    where
        T: 'static,
        H: EventHandler + 'static,
    {
        let close = self.close_handle();
        let mut session = self;
        let task = tokio::spawn(async move { session.run(&mut handler).await });
        Subscription { close, task }
    }

    /// Turns the session into a [`Stream`] of events.
    ///
    /// The stream ends when the session is closed. Any other error is
    /// yielded once and then the stream ends too.
    pub fn into_stream(self) -> impl Stream<Item = Result<Event, SessionError>> + Send
    where
        T: 'static,
    {
        futures_util::stream::unfold(Some(self), |session| async move {
            let mut session = session?;
            match session.next_event().await {
                Ok(Some(event)) => Some((Ok(event), Some(session))),
                Ok(None) | Err(SessionError::Closed) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

/// A push loop running on its own task, see [`Session::start`]
#[derive(Debug)]
pub struct Subscription {
    close: CloseHandle,
    task: JoinHandle<Result<(), SessionError>>,
}

impl Subscription {
    pub fn close_handle(&self) -> CloseHandle {
        self.close.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Closes the session and waits for the loop to wind down
    pub async fn stop(self) -> Result<(), SessionError> {
        self.close.close();
        self.join().await
    }

    /// Waits for the loop to end on its own
    pub async fn join(self) -> Result<(), SessionError> {
        self.task.await?
    }
}
