//! Text codec boundary.
//!
//! Decoding happens once at the input edge and encoding once at each sink,
//! so the rest of the crate works on plain `str` and width arithmetic stays
//! well-defined. Malformed input sequences become U+FFFD; the stream is
//! never aborted for a decode error.

use std::io::{self, Write};

use encoding_rs::Encoding;

/// Incremental decoder for the input byte stream.
pub struct StreamDecoder {
    inner: encoding_rs::Decoder,
}

impl StreamDecoder {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            inner: encoding.new_decoder(),
        }
    }

    /// Decodes the next chunk, carrying incomplete sequences across calls.
    ///
    /// Pass `last = true` exactly once, at end of input, to flush any
    /// pending incomplete sequence as a replacement character.
    pub fn decode(&mut self, bytes: &[u8], last: bool) -> String {
        let capacity = self
            .inner
            .max_utf8_buffer_length(bytes.len())
            .unwrap_or(bytes.len().saturating_mul(3) + 16);
        let mut out = String::with_capacity(capacity);
        let (result, read, _had_errors) = self.inner.decode_to_string(bytes, &mut out, last);
        debug_assert_eq!(result, encoding_rs::CoderResult::InputEmpty);
        debug_assert_eq!(read, bytes.len());
        out
    }
}

/// A writer that encodes `str` data into its target encoding.
pub struct EncodedWriter<W> {
    inner: W,
    encoding: &'static Encoding,
}

impl<W: Write> EncodedWriter<W> {
    pub fn new(inner: W, encoding: &'static Encoding) -> Self {
        Self { inner, encoding }
    }

    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        if self.encoding == encoding_rs::UTF_8 {
            return self.inner.write_all(s.as_bytes());
        }
        let (bytes, _, _) = self.encoding.encode(s);
        self.inner.write_all(&bytes)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
