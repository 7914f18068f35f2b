//! Reader stage: pulls units from an input byte stream.

use crate::container::{self, read_full};
use crate::defaults::IO_BUFFER_SIZE;
use crate::error::{DcaError, Result};
use crate::pipeline::cancel::{CancelToken, send_or_cancel};
use crate::pipeline::error::ErrorReporter;
use crate::pipeline::station::{StageOutcome, StageReport, StageRunner};
use crate::pipeline::types::{OpusFrame, PcmFrame};
use crossbeam_channel::Sender;
use std::io::{self, BufReader, Read};
use std::sync::Arc;
use std::thread;

/// Producer at the head of the pipeline.
pub trait FrameSource: Send + 'static {
    type Output: Send + 'static;

    /// Called on the stage thread before the first read.
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    /// Next unit, or `Ok(None)` at a clean end of stream.
    fn next_frame(&mut self) -> Result<Option<Self::Output>>;

    fn name(&self) -> &'static str;
}

impl StageRunner {
    /// Spawns a source feeding `output_tx`.
    ///
    /// The queue closes when the source ends for any reason.
    pub fn spawn_source<S: FrameSource>(
        mut source: S,
        output_tx: Sender<S::Output>,
        cancel: CancelToken,
        error_reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let stage_name = source.name();
        let handle = thread::spawn(move || {
            run_source(&mut source, output_tx, &cancel, error_reporter.as_ref())
        });
        Self::from_handle(stage_name, handle)
    }
}

fn run_source<S: FrameSource>(
    source: &mut S,
    output_tx: Sender<S::Output>,
    cancel: &CancelToken,
    error_reporter: &dyn ErrorReporter,
) -> StageReport {
    let stage = source.name();
    let mut frames = 0;

    let outcome = match source.start() {
        Err(e) => Some(e),
        Ok(()) => loop {
            match source.next_frame() {
                Ok(Some(frame)) => {
                    if !send_or_cancel(&output_tx, frame, cancel) {
                        break None;
                    }
                    frames += 1;
                }
                Ok(None) => {
                    tracing::debug!(stage, frames, "end of input");
                    return StageReport {
                        stage,
                        outcome: StageOutcome::Finished,
                        frames,
                    };
                }
                Err(e) => break Some(e),
            }
        },
    };

    let outcome = match outcome {
        // Closing the queue is enough for downstream to drain and stop.
        Some(e) => {
            error_reporter.report(stage, &e);
            StageOutcome::Failed(e.to_string())
        }
        None => {
            tracing::debug!(stage, frames, "reader cancelled");
            StageOutcome::Cancelled
        }
    };
    StageReport {
        stage,
        outcome,
        frames,
    }
}

/// Reads fixed-size frames of little-endian PCM16.
pub struct PcmFrameSource {
    reader: BufReader<Box<dyn Read + Send>>,
    buf: Vec<u8>,
    sequence: u64,
}

impl PcmFrameSource {
    /// `samples_per_frame` is `frame_size * channels`.
    pub fn new(reader: Box<dyn Read + Send>, samples_per_frame: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(IO_BUFFER_SIZE, reader),
            buf: vec![0u8; samples_per_frame * 2],
            sequence: 0,
        }
    }
}

impl FrameSource for PcmFrameSource {
    type Output = PcmFrame;

    fn next_frame(&mut self) -> Result<Option<PcmFrame>> {
        let read = read_full(&mut self.reader, &mut self.buf)?;
        if read < self.buf.len() {
            if read > 0 {
                tracing::debug!(bytes = read, "discarding partial trailing frame");
            }
            return Ok(None);
        }

        let frame = PcmFrame::from_le_bytes(&self.buf, self.sequence);
        self.sequence += 1;
        Ok(Some(frame))
    }

    fn name(&self) -> &'static str {
        "pcm-reader"
    }
}

/// Reads length-prefixed Opus packets from a raw DCA stream.
pub struct OpusPacketSource {
    reader: Box<dyn Read + Send>,
    sequence: u64,
}

impl OpusPacketSource {
    pub fn new(reader: Box<dyn Read + Send>) -> Self {
        Self {
            reader,
            sequence: 0,
        }
    }
}

impl FrameSource for OpusPacketSource {
    type Output = OpusFrame;

    /// Decode input must be raw; a container header is refused outright
    /// rather than misread as a frame length.
    fn start(&mut self) -> Result<()> {
        let raw = std::mem::replace(&mut self.reader, Box::new(io::empty()));
        let (has_magic, rest) = container::detect_header(raw)?;
        if has_magic {
            return Err(DcaError::malformed(
                "input starts with a DCA1 header; decode expects raw frames (encode with --raw)",
            ));
        }
        self.reader = Box::new(BufReader::with_capacity(IO_BUFFER_SIZE, rest));
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<OpusFrame>> {
        match container::read_frame(&mut self.reader)? {
            Some(payload) => {
                let frame = OpusFrame::new(payload, self.sequence)?;
                self.sequence += 1;
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "packet-reader"
    }
}
