//! JSON metadata block written after the container magic.

pub mod cover;
pub mod probe;

use crate::config::RunConfig;
use crate::defaults;
use serde::{Deserialize, Serialize};

pub use cover::CoverFormat;
pub use probe::ProbeInfo;

/// Complete metadata record, serialized once as the container header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub dca: DcaInfo,
    pub songinfo: SongInfo,
    pub origin: Origin,
    pub opus: OpusInfo,
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcaInfo {
    pub version: i8,
    pub tool: Tool,
}

/// Identity of the program that wrote the container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub version: String,
    pub url: String,
    pub author: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SongInfo {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub comments: String,
    /// Base64-encoded cover image.
    pub cover: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    /// "file" or "pipe".
    pub source: String,
    /// Source bitrate in bits/s, 0 when unknown.
    pub bitrate: u64,
    pub channels: u16,
    pub encoding: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpusInfo {
    /// Bits per second.
    pub bitrate: i32,
    pub sample_rate: u32,
    pub application: String,
    pub frame_size: usize,
    pub channels: u16,
}

impl Tool {
    fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: crate::version_string(),
            url: env!("CARGO_PKG_REPOSITORY").to_string(),
            author: env!("CARGO_PKG_AUTHORS").replace(':', ", "),
        }
    }
}

impl Metadata {
    /// Metadata for PCM arriving on a pipe, before any probing.
    pub fn new(config: &RunConfig) -> Self {
        let codec = &config.codec;
        Self {
            dca: DcaInfo {
                version: defaults::FORMAT_VERSION,
                tool: Tool::current(),
            },
            songinfo: SongInfo::default(),
            origin: Origin {
                source: "pipe".to_string(),
                bitrate: 0,
                channels: codec.channels,
                encoding: defaults::PIPE_ENCODING.to_string(),
            },
            opus: OpusInfo {
                bitrate: codec.bitrate,
                sample_rate: codec.sample_rate,
                application: codec.application.as_str().to_string(),
                frame_size: codec.frame_size,
                channels: codec.channels,
            },
            extra: serde_json::Map::new(),
        }
    }

    /// Fills song tags and file origin from probe output.
    pub fn with_probe(mut self, probe: &ProbeInfo) -> Self {
        if let Some(tags) = &probe.tags {
            self.songinfo = SongInfo {
                title: tags.title.clone(),
                artist: tags.artist.clone(),
                album: tags.album.clone(),
                genre: tags.genre.clone(),
                comments: String::new(),
                cover: self.songinfo.cover.take(),
            };
        }
        self.origin = Origin {
            source: "file".to_string(),
            bitrate: probe.bitrate,
            channels: self.opus.channels,
            encoding: probe.format_long_name.clone(),
        };
        self
    }

    /// Embeds a base64 cover image.
    pub fn with_cover(mut self, cover: Option<String>) -> Self {
        self.songinfo.cover = cover;
        self
    }
}
