//! Incremental byte to text decoding.
//!
//! Reads can end in the middle of a multi-byte character, so whatever cannot
//! be decoded yet stays buffered until the next call. Only a sequence that
//! can never become valid is an error.

use bytes::{Buf, BytesMut};
use encoding_rs::{DecoderResult, Encoding, UTF_8};

use crate::errors::DecodeError;

pub(crate) enum TextDecoder {
    Utf8 {
        pending: BytesMut,
    },
    Other {
        encoding: &'static Encoding,
        decoder: encoding_rs::Decoder,
    },
}

impl core::fmt::Debug for TextDecoder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TextDecoder")
            .field("encoding", &self.encoding().name())
            .finish_non_exhaustive()
    }
}

impl TextDecoder {
    pub(crate) fn new(encoding: &'static Encoding) -> Self {
        if encoding == UTF_8 {
            TextDecoder::Utf8 {
                pending: BytesMut::new(),
            }
        } else {
            TextDecoder::Other {
                encoding,
                decoder: encoding.new_decoder_without_bom_handling(),
            }
        }
    }

    pub(crate) fn encoding(&self) -> &'static Encoding {
        match self {
            TextDecoder::Utf8 { .. } => UTF_8,
            TextDecoder::Other { encoding, .. } => *encoding,
        }
    }

    /// Decodes `bytes`, appending complete characters to `out` as UTF-8
    pub(crate) fn decode(&mut self, bytes: &[u8], out: &mut BytesMut) -> Result<(), DecodeError> {
        match self {
            TextDecoder::Utf8 { pending } => {
                pending.extend_from_slice(bytes);

                match core::str::from_utf8(pending) {
                    Ok(_) => {
                        out.extend_from_slice(pending);
                        pending.clear();
                        Ok(())
                    }
                    // error_len is None only when the input ends mid character
                    Err(e) if e.error_len().is_none() => {
                        let valid_to = e.valid_up_to();
                        out.extend_from_slice(&pending[..valid_to]);
                        pending.advance(valid_to);
                        Ok(())
                    }
                    Err(_) => Err(DecodeError::new(UTF_8)),
                }
            }
            TextDecoder::Other { encoding, decoder } => {
                let mut text = String::new();
                let mut input = bytes;
                loop {
                    let (result, read) =
                        decoder.decode_to_string_without_replacement(input, &mut text, false);
                    input = &input[read..];
                    match result {
                        DecoderResult::InputEmpty => break,
                        DecoderResult::OutputFull => {
                            let needed = decoder
                                .max_utf8_buffer_length_without_replacement(input.len())
                                .unwrap_or(input.len().saturating_mul(3));
                            text.reserve(needed.max(4));
                        }
                        DecoderResult::Malformed(_, _) => return Err(DecodeError::new(*encoding)),
                    }
                }
                out.extend_from_slice(text.as_bytes());
                Ok(())
            }
        }
    }

    /// Drops any partially received character. Returns the number of bytes
    /// thrown away when that is known.
    pub(crate) fn reset(&mut self) -> usize {
        match self {
            TextDecoder::Utf8 { pending } => {
                let discarded = pending.len();
                pending.clear();
                discarded
            }
            TextDecoder::Other { encoding, decoder } => {
                *decoder = encoding.new_decoder_without_bom_handling();
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(decoder: &mut TextDecoder, chunks: &[&[u8]]) -> Result<Vec<String>, DecodeError> {
        let mut seen = Vec::new();
        for chunk in chunks {
            let mut out = BytesMut::new();
            decoder.decode(chunk, &mut out)?;
            seen.push(String::from_utf8(out.to_vec()).expect("decoder output is utf-8"));
        }
        Ok(seen)
    }

    #[test]
    fn utf8_valid_chunks() {
        let mut decoder = TextDecoder::new(UTF_8);
        assert_eq!(
            decode_all(&mut decoder, &[b"Hello", b", world!"]).unwrap(),
            vec!["Hello", ", world!"]
        );

        // Single emoji in one chunk
        assert_eq!(
            decode_all(&mut decoder, &[&[240, 159, 145, 141]]).unwrap(),
            vec!["👍"]
        );
    }

    #[test]
    fn utf8_split_characters() {
        // Emoji split across two chunks
        let mut decoder = TextDecoder::new(UTF_8);
        assert_eq!(
            decode_all(&mut decoder, &[&[240, 159], &[145, 141]]).unwrap(),
            vec!["", "👍"]
        );

        // One byte at a time
        let mut decoder = TextDecoder::new(UTF_8);
        assert_eq!(
            decode_all(&mut decoder, &[&[0xC3], &[0xA9], b"!"]).unwrap(),
            vec!["", "é", "!"]
        );

        // Split emoji followed by a complete one
        let mut decoder = TextDecoder::new(UTF_8);
        assert_eq!(
            decode_all(&mut decoder, &[&[240, 159], &[145, 141, 240, 159, 145, 141]]).unwrap(),
            vec!["", "👍👍"]
        );
    }

    #[test]
    fn utf8_invalid_bytes_are_fatal() {
        let mut decoder = TextDecoder::new(UTF_8);
        let err = decode_all(&mut decoder, &[b"Hello ", &[0xFF]]).unwrap_err();
        assert_eq!(err.encoding(), "UTF-8");

        // an invalid continuation after a valid lead byte
        let mut decoder = TextDecoder::new(UTF_8);
        assert!(decode_all(&mut decoder, &[&[0xE2], &[0x28, 0xA1]]).is_err());
    }

    #[test]
    fn reset_drops_partial_character() {
        let mut decoder = TextDecoder::new(UTF_8);
        let mut out = BytesMut::new();
        decoder.decode(&[240, 159, 145], &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(decoder.reset(), 3);

        decoder.decode(b"ok", &mut out).unwrap();
        assert_eq!(&out[..], b"ok");
    }

    #[test]
    fn other_encodings() {
        let latin1 = Encoding::for_label(b"latin1").unwrap();
        let mut decoder = TextDecoder::new(latin1);
        assert_eq!(decoder.encoding(), latin1);
        assert_eq!(
            decode_all(&mut decoder, &[b"caf", &[0xE9]]).unwrap(),
            vec!["caf", "é"]
        );

        // UTF-16LE code unit split across reads
        let utf16 = encoding_rs::UTF_16LE;
        let mut decoder = TextDecoder::new(utf16);
        assert_eq!(
            decode_all(&mut decoder, &[&[0x68], &[0x00, 0x69], &[0x00]]).unwrap(),
            vec!["", "h", "i"]
        );
    }

    #[test]
    fn other_encoding_malformed_is_fatal() {
        let shift_jis = encoding_rs::SHIFT_JIS;
        let mut decoder = TextDecoder::new(shift_jis);
        let err = decode_all(&mut decoder, &[&[0x82, 0x20]]).unwrap_err();
        assert_eq!(err.encoding(), "Shift_JIS");
    }
}
