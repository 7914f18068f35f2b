//! Wires reader → transformer → writer for one run.

use crate::codec::{FrameDecoder, FrameEncoder, OpusFrameDecoder, OpusFrameEncoder};
use crate::config::RunConfig;
use crate::error::Result;
use crate::metadata::Metadata;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::codec_station::{DecoderStation, EncoderStation};
use crate::pipeline::error::{ErrorReporter, LogReporter};
use crate::pipeline::sink::{DcaSink, FrameSink, PcmSink};
use crate::pipeline::source::{FrameSource, OpusPacketSource, PcmFrameSource};
use crate::pipeline::station::{StageOutcome, StageReport, StageRunner, Station};
use crossbeam_channel::bounded;
use std::io::{Read, Write};
use std::sync::Arc;

/// Transcoding direction of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// PCM → DCA.
    Encode,
    /// Raw DCA → PCM.
    Decode,
}

/// Per-stage results of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Reader, transformer and writer, in that order.
    pub stages: Vec<StageReport>,
}

impl RunReport {
    /// Frames the writer put on the output stream.
    pub fn frames_written(&self) -> u64 {
        self.stages.last().map_or(0, |stage| stage.frames)
    }

    /// True when every stage ran to the end of its input.
    pub fn is_clean(&self) -> bool {
        self.stages
            .iter()
            .all(|stage| stage.outcome == StageOutcome::Finished)
    }

    /// Stages that stopped on their own error.
    pub fn failures(&self) -> impl Iterator<Item = &StageReport> {
        self.stages
            .iter()
            .filter(|stage| matches!(stage.outcome, StageOutcome::Failed(_)))
    }
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    runners: Vec<StageRunner>,
}

impl PipelineHandle {
    /// Blocks until all three stages have returned.
    pub fn wait(self) -> RunReport {
        let stages = self.runners.into_iter().map(StageRunner::join).collect();
        RunReport { stages }
    }
}

/// Transcoding pipeline: source → codec → sink.
pub struct Pipeline {
    config: RunConfig,
    error_reporter: Arc<dyn ErrorReporter>,
}

impl Pipeline {
    /// Creates a new pipeline with default error reporter.
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            error_reporter: Arc::new(LogReporter),
        }
    }

    /// Sets a custom error reporter.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    /// Starts an encode run with a fresh Opus encoder.
    ///
    /// `metadata` is written as the header unless the config asks for raw
    /// output; `None` falls back to [`Metadata::new`].
    pub fn start_encode(
        self,
        input: Box<dyn Read + Send>,
        output: Box<dyn Write + Send>,
        metadata: Option<Metadata>,
    ) -> Result<PipelineHandle> {
        let encoder = OpusFrameEncoder::new(&self.config.codec)?;
        Ok(self.start_encode_with(input, Box::new(encoder), output, metadata))
    }

    /// Starts an encode run with the given encoder.
    pub fn start_encode_with(
        self,
        input: Box<dyn Read + Send>,
        encoder: Box<dyn FrameEncoder>,
        output: Box<dyn Write + Send>,
        metadata: Option<Metadata>,
    ) -> PipelineHandle {
        let header = if self.config.raw {
            None
        } else {
            Some(metadata.unwrap_or_else(|| Metadata::new(&self.config)))
        };

        let source = PcmFrameSource::new(input, self.config.codec.samples_per_frame());
        let sink = DcaSink::new(output, header);
        self.wire(source, EncoderStation::new(encoder), sink)
    }

    /// Starts a decode run with a fresh Opus decoder.
    ///
    /// The input must be a raw frame stream.
    pub fn start_decode(
        self,
        input: Box<dyn Read + Send>,
        output: Box<dyn Write + Send>,
    ) -> Result<PipelineHandle> {
        let decoder = OpusFrameDecoder::new(&self.config.codec)?;
        Ok(self.start_decode_with(input, Box::new(decoder), output))
    }

    /// Starts a decode run with the given decoder.
    pub fn start_decode_with(
        self,
        input: Box<dyn Read + Send>,
        decoder: Box<dyn FrameDecoder>,
        output: Box<dyn Write + Send>,
    ) -> PipelineHandle {
        let source = OpusPacketSource::new(input);
        let sink = PcmSink::new(output);
        self.wire(source, DecoderStation::new(decoder), sink)
    }

    fn wire<Src, St, Snk>(self, source: Src, station: St, sink: Snk) -> PipelineHandle
    where
        Src: FrameSource,
        St: Station<Input = Src::Output>,
        Snk: FrameSink<Input = St::Output>,
    {
        let cancel = CancelToken::new();
        let (read_tx, read_rx) = bounded(self.config.queue_depth);
        let (coded_tx, coded_rx) = bounded(self.config.queue_depth);

        tracing::info!(
            reader = source.name(),
            transformer = station.name(),
            writer = sink.name(),
            queue_depth = self.config.queue_depth,
            "starting pipeline"
        );

        let reader = StageRunner::spawn_source(
            source,
            read_tx,
            cancel.clone(),
            self.error_reporter.clone(),
        );
        let transformer = StageRunner::spawn_station(
            station,
            read_rx,
            coded_tx,
            cancel.clone(),
            self.error_reporter.clone(),
        );
        let writer = StageRunner::spawn_sink(sink, coded_rx, cancel, self.error_reporter);

        PipelineHandle {
            runners: vec![reader, transformer, writer],
        }
    }
}
