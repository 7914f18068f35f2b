//! dca - DCA audio transcoding
//!
//! Encodes PCM16 audio into DCA (length-framed Opus with an optional JSON
//! metadata header) and decodes raw DCA frames back to PCM16.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod codec;
pub mod config;
pub mod container;
pub mod defaults;
pub mod error;
pub mod input;
pub mod logging;
pub mod metadata;
pub mod pipeline;

// Composition root
#[cfg(feature = "cli")]
pub mod app;

// Codec seam
pub use codec::{Application, FrameDecoder, FrameEncoder, OpusFrameDecoder, OpusFrameEncoder};

// Pipeline
pub use pipeline::{Direction, Pipeline, PipelineHandle, RunReport};

// Error handling
pub use error::{DcaError, Result};

// Config
pub use config::{CodecConfig, Config, RunConfig};

// Container
pub use container::{read_frame, read_header, write_frame, write_header};
pub use metadata::Metadata;

// Station framework (for advanced users)
pub use pipeline::error::ErrorReporter;
pub use pipeline::station::Station;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

// Serializes tests that touch process environment variables.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
