//! Codec adapter: one stateful Opus encoder or decoder per pipeline run.
//!
//! The pipeline only sees the [`FrameEncoder`] and [`FrameDecoder`] traits, so
//! tests can swap in codecs that fail on demand.

pub mod opus;

use crate::error::Result;
use serde::{Deserialize, Serialize};

pub use self::opus::{OpusFrameDecoder, OpusFrameEncoder};

/// Opus application profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Application {
    /// Interactive voice, tuned for speech intelligibility.
    Voip,
    /// General audio, the right choice for music.
    #[default]
    Audio,
    /// Restricted low delay, disables speech-optimized modes.
    LowDelay,
}

impl Application {
    /// Resolves a profile name; anything unrecognized falls back to `Audio`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "voip" => Application::Voip,
            "audio" => Application::Audio,
            "lowdelay" => Application::LowDelay,
            other => {
                tracing::debug!(profile = other, "unknown application profile, using audio");
                Application::Audio
            }
        }
    }

    /// Name as written into the container metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Application::Voip => "voip",
            Application::Audio => "audio",
            Application::LowDelay => "lowdelay",
        }
    }
}

impl From<Application> for ::opus::Application {
    fn from(app: Application) -> Self {
        match app {
            Application::Voip => ::opus::Application::Voip,
            Application::Audio => ::opus::Application::Audio,
            Application::LowDelay => ::opus::Application::LowDelay,
        }
    }
}

/// Turns one PCM frame into one compressed packet.
pub trait FrameEncoder: Send {
    /// Encodes exactly `frame_size * channels` interleaved samples.
    fn encode(&mut self, pcm: &[i16]) -> Result<Vec<u8>>;
}

/// Turns one compressed packet back into interleaved PCM.
pub trait FrameDecoder: Send {
    fn decode(&mut self, packet: &[u8]) -> Result<Vec<i16>>;
}
