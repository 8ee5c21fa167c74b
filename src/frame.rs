//! Splits a byte stream into frames.
//!
//! A frame is everything up to the first `"\n\n"`. Bytes are decoded with the
//! configured encoding as they arrive, characters split across reads are held
//! back until they complete.

use bytes::{Buf, BytesMut};
use bytes_utils::Str;
use encoding_rs::Encoding;
use futures_core::Stream;
use futures_util::StreamExt;
use memchr::memmem;

use crate::{
    constants::{BOM, FRAME_DELIMITER},
    errors::{DecodeError, FrameError},
    text_decoder::TextDecoder,
};

/// Result of [`FrameDecoder::next_frame`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextFrame {
    /// A complete frame without its terminating blank line
    Frame(Str),
    /// The byte source is exhausted
    End,
}

#[derive(Debug)]
pub struct FrameDecoder {
    decoder: TextDecoder,
    /// Decoded text, always whole UTF-8 characters
    text: BytesMut,
    /// Prefix of `text` known to hold no delimiter
    scanned: usize,
    /// Whether the current connection produced any text yet
    started: bool,
}

impl FrameDecoder {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            decoder: TextDecoder::new(encoding),
            text: BytesMut::new(),
            scanned: 0,
            started: false,
        }
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.decoder.encoding()
    }

    /// Text received but not yet returned as a frame
    pub fn pending_text(&self) -> &str {
        core::str::from_utf8(&self.text).unwrap_or_default()
    }

    /// Decodes `bytes` into the text buffer. A byte order mark at the very
    /// start of a connection is dropped.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        let start = self.text.len();
        self.decoder.decode(bytes, &mut self.text)?;

        if !self.started && self.text.len() > start {
            self.started = true;
            if self.text[start..].starts_with(BOM) {
                let mut fresh = self.text.split_off(start);
                fresh.advance(BOM.len());
                self.text.unsplit(fresh);
            }
        }
        Ok(())
    }

    /// Takes the first complete frame out of the text buffer, if there is one
    pub fn next_buffered(&mut self) -> Option<Str> {
        // the delimiter may straddle the old end of the scanned region
        let from = self.scanned.saturating_sub(FRAME_DELIMITER.len() - 1);
        let Some(offset) = memmem::find(&self.text[from..], FRAME_DELIMITER) else {
            self.scanned = self.text.len();
            return None;
        };

        let frame = self.text.split_to(from + offset).freeze();
        self.text.advance(FRAME_DELIMITER.len());
        self.scanned = 0;

        // Safety: text only ever receives whole characters and we split right before an ASCII LF
        Some(unsafe { Str::from_inner_unchecked(frame) })
    }

    /// Reads from `source` until a complete frame is buffered or the source
    /// ends. On [`NextFrame::End`] any partial frame is left in place.
    pub async fn next_frame<S, B, E>(&mut self, source: &mut S) -> Result<NextFrame, FrameError<E>>
    where
        S: Stream<Item = Result<B, E>> + Unpin,
        B: AsRef<[u8]>,
    {
        loop {
            if let Some(frame) = self.next_buffered() {
                return Ok(NextFrame::Frame(frame));
            }

            match source.next().await {
                Some(Ok(bytes)) => self.feed(bytes.as_ref())?,
                Some(Err(e)) => return Err(FrameError::Transport(e)),
                None => return Ok(NextFrame::End),
            }
        }
    }

    /// Prepares for a new connection. Text after the last frame delimiter
    /// cannot be resumed and is dropped along with any half decoded
    /// character. Returns the number of bytes discarded.
    pub fn discard_partial_frame(&mut self) -> usize {
        let undecoded = self.decoder.reset();
        let keep = memmem::rfind(&self.text, FRAME_DELIMITER)
            .map_or(0, |pos| pos + FRAME_DELIMITER.len());
        let discarded = self.text.len() - keep;

        self.text.truncate(keep);
        self.scanned = 0;
        self.started = false;
        discarded + undecoded
    }
}
