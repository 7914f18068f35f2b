//! Units of work passed between pipeline stages.

use crate::container::MAX_FRAME_LEN;
use crate::error::{DcaError, Result};

/// One frame of interleaved PCM samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmFrame {
    /// PCM samples (16-bit signed integers), `frame_size * channels` long.
    pub samples: Vec<i16>,
    /// Position of this frame in the stream.
    pub sequence: u64,
}

impl PcmFrame {
    pub fn new(samples: Vec<i16>, sequence: u64) -> Self {
        Self { samples, sequence }
    }

    /// Decodes little-endian 16-bit samples.
    pub fn from_le_bytes(bytes: &[u8], sequence: u64) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self { samples, sequence }
    }

    /// Encodes the samples as little-endian bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.samples
            .iter()
            .flat_map(|sample| sample.to_le_bytes())
            .collect()
    }
}

/// One compressed Opus packet whose length fits a frame record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpusFrame {
    payload: Vec<u8>,
    sequence: u64,
}

impl OpusFrame {
    /// Fails with [`DcaError::FrameTooLarge`] past 65535 bytes.
    pub fn new(payload: Vec<u8>, sequence: u64) -> Result<Self> {
        if payload.len() > MAX_FRAME_LEN {
            return Err(DcaError::FrameTooLarge {
                len: payload.len(),
            });
        }
        Ok(Self { payload, sequence })
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}
