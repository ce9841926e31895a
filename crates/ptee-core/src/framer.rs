//! Line framing.
//!
//! Converts an already-decoded character stream into line events. The framer
//! owns the partial-line state: when the pipeline's timeout fires with an
//! unterminated tail buffered, the tail is flushed for immediate display and
//! everything up to the next newline becomes a single bypass line that skips
//! classification (a line the user has already partially seen must not be
//! reclassified and overwritten after the fact).

/// Framing events, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// A complete line, without its terminating newline. `bypass` marks a
    /// line whose prefix was already flushed by the partial-line timeout;
    /// the text still carries the full concatenated line.
    Line { text: String, bypass: bool },
    /// The unterminated tail, flushed by the timeout (or at end of stream).
    PartialFlush(String),
    /// Input is exhausted; emitted exactly once, last.
    EndOfStream,
}

#[derive(Debug, Default)]
pub struct Framer {
    /// Characters received since the last newline or partial flush.
    buffer: String,
    /// Concatenation of the flushed partials of the current run.
    run: String,
    in_partial_run: bool,
}

impl Framer {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when an unterminated tail is buffered (the timeout should be
    /// armed).
    pub fn has_partial(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Feeds the next decoded chunk, appending resulting events to `out`.
    pub fn push(&mut self, chunk: &str, out: &mut Vec<FrameEvent>) {
        self.buffer.push_str(chunk);
        while let Some(pos) = self.buffer.find('\n') {
            let rest = self.buffer.split_off(pos + 1);
            let mut line = std::mem::replace(&mut self.buffer, rest);
            line.pop();
            if self.in_partial_run {
                let mut text = std::mem::take(&mut self.run);
                text.push_str(&line);
                self.in_partial_run = false;
                out.push(FrameEvent::Line { text, bypass: true });
            } else {
                out.push(FrameEvent::Line {
                    text: line,
                    bypass: false,
                });
            }
        }
    }

    /// Flushes the buffered tail after the partial-line timeout fired.
    ///
    /// No-op with an empty buffer, so a late timer tick is harmless.
    pub fn flush_partial(&mut self, out: &mut Vec<FrameEvent>) {
        if self.buffer.is_empty() {
            return;
        }
        let flushed = std::mem::take(&mut self.buffer);
        self.run.push_str(&flushed);
        self.in_partial_run = true;
        out.push(FrameEvent::PartialFlush(flushed));
    }

    /// Signals end of input, flushing any unterminated tail first.
    pub fn finish(&mut self, out: &mut Vec<FrameEvent>) {
        self.flush_partial(out);
        out.push(FrameEvent::EndOfStream);
    }
}
