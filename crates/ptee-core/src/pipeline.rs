//! Pipeline wiring: framer → classifier → status model → renderer.
//!
//! The pipeline is the single owner of all streaming state. It consumes raw
//! byte chunks from the input channel, decodes them, and threads the
//! resulting frame events through classification and rendering. The only
//! suspension points are the channel read, the partial-line timeout, and
//! the interrupt signal; everything downstream is synchronous.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::classify::{Classifier, LineClass};
use crate::codec::StreamDecoder;
use crate::config::Config;
use crate::framer::{FrameEvent, Framer};
use crate::interrupt::{self, InterruptedError};
use crate::render::Renderer;
use crate::status::StatusModel;

/// Bound on buffered input chunks between the reader and the pipeline.
pub const INPUT_CHANNEL_CAPACITY: usize = 10;

pub type InputTx = mpsc::Sender<Vec<u8>>;
pub type InputRx = mpsc::Receiver<Vec<u8>>;

pub fn input_channel() -> (InputTx, InputRx) {
    mpsc::channel(INPUT_CHANNEL_CAPACITY)
}

pub struct Pipeline {
    framer: Framer,
    classifier: Classifier,
    status: StatusModel,
    renderer: Renderer,
    decoder: StreamDecoder,
    partial_timeout: Duration,
}

impl Pipeline {
    pub fn new(config: Config, renderer: Renderer) -> Self {
        Self {
            framer: Framer::new(),
            classifier: Classifier::new(config.rules),
            status: StatusModel::new(),
            renderer,
            decoder: StreamDecoder::new(config.encoding),
            partial_timeout: config.partial_line_timeout,
        }
    }

    /// Drains the input channel to end of stream.
    ///
    /// A closed channel is end of input (the reader treats read errors as
    /// EOF after posting what it has). Returns `InterruptedError` when a
    /// signal arrives, after erasing the live status.
    ///
    /// # Errors
    /// Fails when the primary sink cannot be written.
    pub async fn run(mut self, mut input: InputRx) -> Result<()> {
        let mut events = Vec::new();
        loop {
            let chunk = if self.framer.has_partial() && !self.partial_timeout.is_zero() {
                tokio::select! {
                    chunk = input.recv() => chunk,
                    () = tokio::time::sleep(self.partial_timeout) => {
                        self.framer.flush_partial(&mut events);
                        self.dispatch(&mut events)?;
                        continue;
                    }
                    () = interrupt::wait_for_interrupt() => return self.interrupted(),
                }
            } else {
                tokio::select! {
                    chunk = input.recv() => chunk,
                    () = interrupt::wait_for_interrupt() => return self.interrupted(),
                }
            };
            let Some(bytes) = chunk else { break };
            let text = self.decoder.decode(&bytes, false);
            self.framer.push(&text, &mut events);
            self.dispatch(&mut events)?;
        }

        let tail = self.decoder.decode(&[], true);
        if !tail.is_empty() {
            self.framer.push(&tail, &mut events);
        }
        self.framer.finish(&mut events);
        self.dispatch(&mut events)
    }

    fn dispatch(&mut self, events: &mut Vec<FrameEvent>) -> Result<()> {
        for event in events.drain(..) {
            match event {
                FrameEvent::Line { text, bypass } => {
                    match self.classifier.classify(&text, bypass) {
                        None => {}
                        Some(LineClass::Regular) if bypass => {
                            self.renderer.finish_partial_line(&text)?;
                        }
                        Some(LineClass::Regular) => {
                            self.renderer.regular(&mut self.status, &text)?;
                        }
                        Some(LineClass::Context { level }) => {
                            self.status.set_context(level, &text);
                            self.renderer.context_update(&self.status)?;
                        }
                        Some(LineClass::Heading) => {
                            self.renderer.heading(&self.status, &text)?;
                        }
                        // The classifier folds skips into its countdown.
                        Some(LineClass::Skip { .. }) => unreachable!(),
                    }
                }
                FrameEvent::PartialFlush(text) => {
                    self.renderer.partial_flush(&mut self.status, &text)?;
                }
                FrameEvent::EndOfStream => {
                    self.renderer.end_of_stream()?;
                }
            }
        }
        Ok(())
    }

    fn interrupted(&mut self) -> Result<()> {
        let _ = self.renderer.clear_live();
        let _ = self.renderer.flush_all();
        Err(InterruptedError.into())
    }
}
