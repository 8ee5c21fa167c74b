//! Non-fatal problems found while parsing frames.
//!
//! A malformed line never aborts a frame or a stream, it is dropped and
//! reported to a [`DiagnosticSink`]. Every [`Session`][crate::Session] owns its
//! own sink so reports from different sessions never mix.

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

/// A line that was discarded while parsing a frame
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// The field name is not one of `data`, `event`, `id` or `retry`
    #[error("unknown field `{field}` in line {line:?}")]
    UnknownField { field: String, line: String },
    /// The `retry` value is not a non-negative integer
    #[error("invalid retry value {value:?}")]
    InvalidRetry { value: String },
}

/// Receiver for [`Diagnostic`]s
pub trait DiagnosticSink: Send + Sync {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Default sink, emits each diagnostic as a `warn` level [`tracing`] event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(%diagnostic, "discarded malformed sse line");
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl DiagnosticSink for UnboundedSender<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        // a dropped receiver just means nobody is listening anymore
        let _ = self.send(diagnostic);
    }
}

impl<S> DiagnosticSink for &mut S
where
    S: DiagnosticSink + ?Sized,
{
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic)
    }
}

impl<S> DiagnosticSink for Box<S>
where
    S: DiagnosticSink + ?Sized,
{
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_field() {
        let diagnostic = Diagnostic::UnknownField {
            field: "foo".into(),
            line: "foo: bar".into(),
        };
        assert_eq!(
            diagnostic.to_string(),
            "unknown field `foo` in line \"foo: bar\""
        );

        let diagnostic = Diagnostic::InvalidRetry { value: "soon".into() };
        assert_eq!(diagnostic.to_string(), "invalid retry value \"soon\"");
    }

    #[tokio::test]
    async fn channel_sink_forwards_reports() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut sink: Box<dyn DiagnosticSink> = Box::new(tx);
        sink.report(Diagnostic::InvalidRetry { value: "x".into() });
        drop(sink);

        assert_eq!(
            rx.recv().await,
            Some(Diagnostic::InvalidRetry { value: "x".into() })
        );
        assert_eq!(rx.recv().await, None);
    }
}
