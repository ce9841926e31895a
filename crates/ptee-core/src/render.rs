//! Sink fan-out and status-line drawing.
//!
//! The renderer owns every output sink. On a terminal, context updates
//! overwrite a single status line with carriage returns, padded with spaces
//! so a shorter status exactly erases a longer predecessor. On plain sinks
//! the overwritten churn is stripped (or recorded verbatim with
//! `--no-strip`); the status promoted by a regular line is written either
//! way, one context level per line.
//!
//! A failed write on the primary sink is fatal. A failed auxiliary sink is
//! reported to stderr and dropped from the fan-out.

use std::io::{self, Write};

use anyhow::{Context, Result};
use encoding_rs::Encoding;

use crate::codec::EncodedWriter;
use crate::status::StatusModel;

/// Whether a sink is an interactive terminal or a byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Terminal,
    Stream,
}

/// Strip-mode selection; `Auto` strips exactly the non-terminal sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StripPolicy {
    #[default]
    Auto,
    AlwaysStrip,
    NeverStrip,
}

impl StripPolicy {
    fn resolve(self, kind: SinkKind) -> SinkMode {
        match (kind, self) {
            (SinkKind::Terminal, StripPolicy::Auto | StripPolicy::NeverStrip) => {
                SinkMode::Overwriting
            }
            (SinkKind::Terminal, StripPolicy::AlwaysStrip) => SinkMode::Plain { strip: true },
            (SinkKind::Stream, StripPolicy::NeverStrip) => SinkMode::Plain { strip: false },
            (SinkKind::Stream, StripPolicy::Auto | StripPolicy::AlwaysStrip) => {
                SinkMode::Plain { strip: true }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkMode {
    Overwriting,
    Plain { strip: bool },
}

pub struct Sink {
    label: String,
    writer: EncodedWriter<Box<dyn Write + Send>>,
    mode: SinkMode,
    /// Printable width of the last status drawn (overwriting mode only);
    /// the erase pad is sized from this.
    last_width: usize,
}

impl Sink {
    pub fn new(
        label: impl Into<String>,
        writer: Box<dyn Write + Send>,
        kind: SinkKind,
        policy: StripPolicy,
        encoding: &'static Encoding,
    ) -> Self {
        Self {
            label: label.into(),
            writer: EncodedWriter::new(writer, encoding),
            mode: policy.resolve(kind),
            last_width: 0,
        }
    }

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_str(text)
    }

    fn write_pad(&mut self, count: usize) -> io::Result<()> {
        if count > 0 {
            let pad = " ".repeat(count);
            self.writer.write_str(&pad)?;
        }
        Ok(())
    }

    /// Draws the live status: overwrite in place on a terminal, literal
    /// `status\r` on a no-strip plain sink, nothing on a stripped sink.
    fn draw_status(&mut self, composed: &str, width: Option<usize>) -> io::Result<()> {
        match self.mode {
            SinkMode::Overwriting => {
                let mut shown = display_form(composed);
                if let Some(width) = width {
                    shown = truncate_status(&shown, width);
                }
                let new_width = shown.chars().count();
                if new_width == 0 && self.last_width == 0 {
                    return Ok(());
                }
                self.write_text("\r")?;
                self.write_text(&shown)?;
                self.write_pad(self.last_width.saturating_sub(new_width))?;
                self.write_text("\r")?;
                self.last_width = new_width;
            }
            SinkMode::Plain { strip: false } => {
                if !composed.is_empty() {
                    self.write_text(composed)?;
                    self.write_text("\r")?;
                }
            }
            SinkMode::Plain { strip: true } => {}
        }
        Ok(())
    }

    /// Blanks the live status row and returns the cursor to column 0.
    fn erase_status(&mut self) -> io::Result<()> {
        if self.mode == SinkMode::Overwriting && self.last_width > 0 {
            self.write_text("\r")?;
            self.write_pad(self.last_width)?;
            self.write_text("\r")?;
            self.last_width = 0;
        }
        Ok(())
    }

    /// Promotes the pending context lines to permanent output.
    fn commit(&mut self, pending: &[&str]) -> io::Result<()> {
        self.erase_status()?;
        for line in pending {
            self.write_text(line)?;
            self.write_text("\n")?;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Tab-expanded (8-column stops), right-trimmed form used for drawing.
/// The stored status is never normalized; this is display-only.
fn display_form(status: &str) -> String {
    let mut out = String::with_capacity(status.len());
    let mut column = 0;
    for ch in status.chars() {
        if ch == '\t' {
            let stop = 8 - column % 8;
            for _ in 0..stop {
                out.push(' ');
            }
            column += stop;
        } else {
            out.push(ch);
            column += 1;
        }
    }
    out.truncate(out.trim_end().len());
    out
}

/// Shortens a status to `width` columns with a middle ellipsis, keeping
/// roughly the first three quarters and the final quarter. Widths are
/// naive character counts, so double-width characters may under-erase.
fn truncate_status(status: &str, width: usize) -> String {
    let len = status.chars().count();
    if width == 0 || len <= width {
        return status.to_string();
    }
    const MIN_ELLIPSIS_LEN: usize = 10;
    const ELLIPSIS: &str = " ... ";
    if len >= MIN_ELLIPSIS_LEN {
        let room = width.saturating_sub(ELLIPSIS.len());
        let pre = room * 3 / 4;
        let post = room - pre;
        let spliced: String = status
            .chars()
            .take(pre)
            .chain(ELLIPSIS.chars())
            .chain(status.chars().skip(len - post))
            .collect();
        spliced.chars().take(width).collect()
    } else {
        status.chars().take(width).collect()
    }
}

pub struct Renderer {
    primary: Sink,
    aux: Vec<Sink>,
    /// Fixed truncation width; zero queries the terminal at each draw.
    width: usize,
    /// Characters of the current partial run already written via flushes.
    partial_emitted: usize,
}

impl Renderer {
    pub fn new(primary: Sink, aux: Vec<Sink>, width: usize) -> Self {
        Self {
            primary,
            aux,
            width,
            partial_emitted: 0,
        }
    }

    /// Width used for status truncation at this draw, if known.
    fn display_width(&self) -> Option<usize> {
        if self.width > 0 {
            return Some(self.width);
        }
        crossterm::terminal::size()
            .ok()
            .map(|(columns, _rows)| columns as usize)
    }

    /// Runs one write operation across every sink. The primary sink is
    /// fatal on error (after a best-effort status clear); an auxiliary
    /// sink that fails is reported and dropped.
    fn fan_out<F>(&mut self, mut op: F) -> Result<()>
    where
        F: FnMut(&mut Sink) -> io::Result<()>,
    {
        let mut result = op(&mut self.primary);
        if result.is_ok() {
            result = self.primary.flush();
        }
        if let Err(e) = result {
            let _ = self.primary.erase_status();
            let _ = self.primary.flush();
            return Err(e).with_context(|| format!("write to {}", self.primary.label));
        }
        self.aux.retain_mut(|sink| match op(sink) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("ptee: {}: {e}; dropping this output file", sink.label);
                false
            }
        });
        Ok(())
    }

    /// A context line updated the table: redraw the live status.
    pub fn context_update(&mut self, status: &StatusModel) -> Result<()> {
        let composed = status.composed();
        let width = self.display_width();
        self.fan_out(|sink| sink.draw_status(&composed, width))
    }

    /// A regular line: promote the pending status, then print the line.
    pub fn regular(&mut self, status: &mut StatusModel, line: &str) -> Result<()> {
        let pending: Vec<String> = status.pending().map(str::to_string).collect();
        let pending: Vec<&str> = pending.iter().map(String::as_str).collect();
        self.fan_out(|sink| {
            sink.commit(&pending)?;
            sink.write_text(line)?;
            sink.write_text("\n")
        })?;
        status.mark_committed();
        Ok(())
    }

    /// A heading line: printed on its own, without promoting the status;
    /// on the terminal the live status is redrawn underneath afterwards.
    pub fn heading(&mut self, status: &StatusModel, line: &str) -> Result<()> {
        let composed = status.composed();
        let width = self.display_width();
        self.fan_out(|sink| {
            sink.erase_status()?;
            sink.write_text(line)?;
            sink.write_text("\n")?;
            if sink.mode == SinkMode::Overwriting {
                sink.draw_status(&composed, width)?;
            }
            Ok(())
        })
    }

    /// The timeout flushed an unterminated tail. The first flush of a run
    /// promotes the pending status (the tail is regular material); the
    /// flushed text itself is written with no newline.
    pub fn partial_flush(&mut self, status: &mut StatusModel, text: &str) -> Result<()> {
        if self.partial_emitted == 0 {
            let pending: Vec<String> = status.pending().map(str::to_string).collect();
            let pending: Vec<&str> = pending.iter().map(String::as_str).collect();
            self.fan_out(|sink| sink.commit(&pending))?;
            status.mark_committed();
        }
        self.fan_out(|sink| sink.write_text(text))?;
        self.partial_emitted += text.chars().count();
        Ok(())
    }

    /// The newline ending a partial run arrived: write the portion of the
    /// bypass line the flushes have not already emitted, then the newline.
    pub fn finish_partial_line(&mut self, text: &str) -> Result<()> {
        let rest: String = text.chars().skip(self.partial_emitted).collect();
        self.partial_emitted = 0;
        self.fan_out(|sink| {
            sink.write_text(&rest)?;
            sink.write_text("\n")
        })
    }

    /// Erases the live status without promoting it.
    pub fn clear_live(&mut self) -> Result<()> {
        self.fan_out(Sink::erase_status)
    }

    /// End of input: erase the live status and flush every sink.
    pub fn end_of_stream(&mut self) -> Result<()> {
        self.fan_out(Sink::erase_status)?;
        self.flush_all()
    }

    pub fn flush_all(&mut self) -> Result<()> {
        self.primary
            .flush()
            .with_context(|| format!("flush {}", self.primary.label))?;
        self.aux.retain_mut(|sink| match sink.flush() {
            Ok(()) => true,
            Err(e) => {
                eprintln!("ptee: {}: {e}; dropping this output file", sink.label);
                false
            }
        });
        Ok(())
    }
}
