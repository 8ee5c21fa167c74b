//! A single Server-Sent Events message and its wire form.
//!
//! [`Event::parse`] reads one frame, a block of lines that contains no blank
//! line, and [`Event::serialize`] writes the canonical frame back out.

use core::{
    fmt::{self, Display, Formatter},
    time::Duration,
};

use bytes::Bytes;
use bytes_utils::Str;

use crate::{
    constants::{COLON, DEFAULT_EVENT_TYPE, EMPTY_STR, LF, MESSAGE_STR},
    diagnostics::{Diagnostic, DiagnosticSink},
};

/// Event with immutable fields, produced once per frame
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    /// Event type, `"message"` unless the frame names one
    pub event: Str,
    /// Every `data` line of the frame joined with `\n`
    pub data: Str,
    /// Resumption identifier
    pub id: Option<Str>,
    /// Reconnect delay advised by the server
    pub retry: Option<Duration>,
}

impl Default for Event {
    fn default() -> Self {
        Self {
            event: MESSAGE_STR,
            data: EMPTY_STR,
            id: None,
            retry: None,
        }
    }
}

pub(crate) fn owned_str(value: String) -> Str {
    // Safety: the bytes come straight out of a `String`
    unsafe { Str::from_inner_unchecked(Bytes::from(value)) }
}

/// Field names understood by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldName {
    Event,
    Data,
    Id,
    Retry,
    Unknown,
}

impl From<&str> for FieldName {
    fn from(name: &str) -> Self {
        match name {
            "event" => FieldName::Event,
            "data" => FieldName::Data,
            "id" => FieldName::Id,
            "retry" => FieldName::Retry,
            _ => FieldName::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawLine<'a> {
    Empty,
    Comment,
    Field { name: &'a str, value: &'a str },
}

fn read_line(line: &str) -> RawLine<'_> {
    match memchr::memchr(COLON as u8, line.as_bytes()) {
        Some(0) => RawLine::Comment,
        Some(colon_pos) => {
            let value = &line[colon_pos + 1..];
            RawLine::Field {
                name: &line[..colon_pos],
                value: value.strip_prefix(' ').unwrap_or(value),
            }
        }
        None if line.is_empty() => RawLine::Empty,
        None => RawLine::Field {
            name: line,
            value: "",
        },
    }
}

impl Event {
    /// Event of the default type carrying `data`
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: owned_str(data.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = owned_str(event.into());
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(owned_str(id.into()));
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: Duration) -> Self {
        self.retry = Some(retry);
        self
    }

    /// `true` when the event type is `"message"`
    pub fn is_default_type(&self) -> bool {
        &*self.event == DEFAULT_EVENT_TYPE
    }

    /// Parses one frame into an [`Event`].
    ///
    /// Lines are split on their first colon and a single space after it is
    /// dropped. A line starting with a colon is a comment and a line without
    /// one is a field with an empty value. Repeated `event`, `id` and `retry`
    /// fields overwrite each other while `data` lines accumulate.
    ///
    /// Unknown fields and unparseable `retry` values are reported to
    /// `diagnostics` and skipped, the rest of the frame is still read.
    pub fn parse<D>(raw: &str, diagnostics: &mut D) -> Event
    where
        D: DiagnosticSink + ?Sized,
    {
        let mut data = String::new();
        let mut event = None;
        let mut id = None;
        let mut retry = None;

        for line in raw.split(LF) {
            let (name, value) = match read_line(line) {
                RawLine::Empty | RawLine::Comment => continue,
                RawLine::Field { name, value } => (name, value),
            };

            match FieldName::from(name) {
                FieldName::Data => {
                    if !data.is_empty() {
                        data.push(LF);
                    }
                    data.push_str(value);
                }
                FieldName::Event => event = Some(value),
                FieldName::Id => id = Some(value),
                FieldName::Retry => match value.parse::<u64>() {
                    Ok(millis) => retry = Some(Duration::from_millis(millis)),
                    Err(_) => diagnostics.report(Diagnostic::InvalidRetry {
                        value: value.to_owned(),
                    }),
                },
                FieldName::Unknown => diagnostics.report(Diagnostic::UnknownField {
                    field: name.to_owned(),
                    line: line.to_owned(),
                }),
            }
        }

        Event {
            event: event.map_or(MESSAGE_STR, |event| owned_str(event.to_owned())),
            data: owned_str(data),
            id: id.map(|id| owned_str(id.to_owned())),
            retry,
        }
    }

    /// Canonical frame for this event, terminated by a blank line
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(id) = &self.id {
            writeln!(f, "id: {id}")?;
        }
        if !self.is_default_type() {
            writeln!(f, "event: {}", self.event)?;
        }
        if let Some(retry) = self.retry {
            writeln!(f, "retry: {}", retry.as_millis())?;
        }
        for line in self.data.split(LF) {
            writeln!(f, "data: {line}")?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> (Event, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let event = Event::parse(raw, &mut diagnostics);
        (event, diagnostics)
    }

    #[test]
    fn multiple_data_lines_join_with_newline() {
        let (event, diagnostics) = parse("data: foo\ndata: bar");
        assert_eq!(&*event.data, "foo\nbar");
        assert_eq!(event.event, MESSAGE_STR);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn comments_are_ignored() {
        let (event, diagnostics) = parse(": this is a comment\ndata: x");
        assert_eq!(event, Event::new("x"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn unknown_field_is_reported_once() {
        let (event, diagnostics) = parse("foo: bar\ndata: x");
        assert_eq!(event, Event::new("x"));
        assert_eq!(
            diagnostics,
            vec![Diagnostic::UnknownField {
                field: "foo".into(),
                line: "foo: bar".into(),
            }]
        );
    }

    #[test]
    fn invalid_retry_is_reported_and_skipped() {
        let (event, diagnostics) = parse("retry: 10\nretry: soon\nretry\ndata: x");
        assert_eq!(event.retry, Some(Duration::from_millis(10)));
        assert_eq!(
            diagnostics,
            vec![
                Diagnostic::InvalidRetry {
                    value: "soon".into()
                },
                Diagnostic::InvalidRetry { value: "".into() },
            ]
        );

        let (event, diagnostics) = parse("retry: -5");
        assert_eq!(event.retry, None);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn last_occurrence_wins() {
        let (event, _) = parse("event: a\nid: 1\nretry: 100\nevent: b\nid: 2\nretry: 200");
        assert_eq!(&*event.event, "b");
        assert_eq!(event.id.as_deref(), Some("2"));
        assert_eq!(event.retry, Some(Duration::from_millis(200)));
    }

    #[test]
    fn value_spacing() {
        let (event, _) = parse("data:no space");
        assert_eq!(&*event.data, "no space");

        let (event, _) = parse("data:  two spaces");
        assert_eq!(&*event.data, " two spaces");

        let (event, _) = parse("data: a: b");
        assert_eq!(&*event.data, "a: b");

        // a bare name is a field with an empty value
        let (event, _) = parse("id");
        assert_eq!(event.id.as_deref(), Some(""));
    }

    #[test]
    fn empty_data_lines_do_not_add_separators() {
        let (event, _) = parse("data\ndata: x");
        assert_eq!(&*event.data, "x");

        let (event, _) = parse("data: x\ndata\ndata: y");
        assert_eq!(&*event.data, "x\n\ny");
    }

    #[test]
    fn empty_frame_gives_defaults() {
        let (event, diagnostics) = parse("");
        assert_eq!(event, Event::default());
        assert!(event.is_default_type());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn serialize_omits_unset_fields() {
        assert_eq!(Event::new("hello").serialize(), "data: hello\n\n");
        assert_eq!(
            Event::new("a\nb")
                .with_event("update")
                .with_id("7")
                .with_retry(Duration::from_millis(1500))
                .serialize(),
            "id: 7\nevent: update\nretry: 1500\ndata: a\ndata: b\n\n"
        );
    }

    #[test]
    fn parse_reads_back_serialized_events() {
        let events = [
            Event::new("plain"),
            Event::new("two\nlines").with_event("update"),
            Event::new("{\"k\":1}")
                .with_id("abc-1")
                .with_retry(Duration::from_secs(5)),
            Event::new("ünïcödé 👍").with_event("emoji"),
        ];

        for event in events {
            let frame = event.serialize();
            let frame = frame.strip_suffix("\n\n").expect("frame terminator");
            let (parsed, diagnostics) = parse(frame);
            assert_eq!(parsed, event);
            assert!(diagnostics.is_empty());
        }
    }
}
