//! Writer stage: serializes units to the output byte stream.

use crate::container;
use crate::defaults::IO_BUFFER_SIZE;
use crate::error::Result;
use crate::metadata::Metadata;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::error::ErrorReporter;
use crate::pipeline::station::{StageOutcome, StageReport, StageRunner};
use crate::pipeline::types::{OpusFrame, PcmFrame};
use crossbeam_channel::Receiver;
use std::io::{BufWriter, Write};
use std::sync::Arc;
use std::thread;

/// Consumer at the tail of the pipeline.
pub trait FrameSink: Send + 'static {
    type Input: Send + 'static;

    /// Called once before the first frame.
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_frame(&mut self, frame: Self::Input) -> Result<()>;

    /// Called once the input queue is closed and drained.
    fn finish(&mut self) -> Result<()>;

    fn name(&self) -> &'static str;
}

impl StageRunner {
    /// Spawns a sink draining `input_rx` until it is closed and empty.
    pub fn spawn_sink<S: FrameSink>(
        mut sink: S,
        input_rx: Receiver<S::Input>,
        cancel: CancelToken,
        error_reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let stage_name = sink.name();
        let handle = thread::spawn(move || {
            run_sink(&mut sink, input_rx, &cancel, error_reporter.as_ref())
        });
        Self::from_handle(stage_name, handle)
    }
}

fn run_sink<S: FrameSink>(
    sink: &mut S,
    input_rx: Receiver<S::Input>,
    cancel: &CancelToken,
    error_reporter: &dyn ErrorReporter,
) -> StageReport {
    let stage = sink.name();
    let mut frames = 0;

    let result = (|| -> Result<()> {
        sink.start()?;
        for frame in input_rx.iter() {
            sink.write_frame(frame)?;
            frames += 1;
        }
        sink.finish()
    })();

    let outcome = match result {
        Ok(()) => StageOutcome::Finished,
        Err(e) => {
            error_reporter.report(stage, &e);
            cancel.cancel();
            StageOutcome::Failed(e.to_string())
        }
    };
    tracing::debug!(stage, frames, ?outcome, "writer stopped");
    StageReport {
        stage,
        outcome,
        frames,
    }
}

/// Writes Opus packets as a DCA stream, with or without the header.
pub struct DcaSink {
    writer: BufWriter<Box<dyn Write + Send>>,
    header: Option<Metadata>,
}

impl DcaSink {
    /// `header` of `None` produces a raw stream.
    pub fn new(writer: Box<dyn Write + Send>, header: Option<Metadata>) -> Self {
        Self {
            writer: BufWriter::with_capacity(IO_BUFFER_SIZE, writer),
            header,
        }
    }
}

impl FrameSink for DcaSink {
    type Input = OpusFrame;

    fn start(&mut self) -> Result<()> {
        if let Some(metadata) = self.header.take() {
            container::write_header(&mut self.writer, &metadata)?;
        }
        Ok(())
    }

    fn write_frame(&mut self, frame: OpusFrame) -> Result<()> {
        container::write_frame(&mut self.writer, frame.payload())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dca-writer"
    }
}

/// Writes decoded PCM as bare little-endian samples.
pub struct PcmSink {
    writer: BufWriter<Box<dyn Write + Send>>,
}

impl PcmSink {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: BufWriter::with_capacity(IO_BUFFER_SIZE, writer),
        }
    }
}

impl FrameSink for PcmSink {
    type Input = PcmFrame;

    fn write_frame(&mut self, frame: PcmFrame) -> Result<()> {
        self.writer.write_all(&frame.to_le_bytes())?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "pcm-writer"
    }
}
