//! Threaded transcoding pipeline.
//!
//! A reader, a transformer and a writer each run on their own thread,
//! connected by bounded crossbeam channels for backpressure. A shared
//! [`CancelToken`] lets any failing stage release the others.

pub mod cancel;
pub mod codec_station;
pub mod error;
pub mod keep_alive;
pub mod orchestrator;
pub mod sink;
pub mod source;
pub mod station;
pub mod types;

pub use cancel::CancelToken;
pub use codec_station::{DecoderStation, EncoderStation};
pub use error::{ErrorReporter, LogReporter};
pub use keep_alive::{KeepAlive, KeepAliveRelease, keep_alive};
pub use orchestrator::{Direction, Pipeline, PipelineHandle, RunReport};
pub use sink::{DcaSink, FrameSink, PcmSink};
pub use source::{FrameSource, OpusPacketSource, PcmFrameSource};
pub use station::{StageOutcome, StageReport, StageRunner, Station};
pub use types::{OpusFrame, PcmFrame};
