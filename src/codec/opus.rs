//! libopus-backed implementations of the codec traits.

use crate::codec::{FrameDecoder, FrameEncoder};
use crate::config::CodecConfig;
use crate::error::{DcaError, Result};
use ::opus::{Bitrate, Channels, Decoder, Encoder};

fn opus_channels(channels: u16) -> Result<Channels> {
    match channels {
        1 => Ok(Channels::Mono),
        2 => Ok(Channels::Stereo),
        other => Err(DcaError::ConfigInvalidValue {
            key: "channels".to_string(),
            message: format!("opus supports 1 or 2 channels, got {}", other),
        }),
    }
}

/// Opus encoder configured once for a single run.
pub struct OpusFrameEncoder {
    encoder: Encoder,
    samples_per_frame: usize,
    max_packet_bytes: usize,
}

impl OpusFrameEncoder {
    pub fn new(config: &CodecConfig) -> Result<Self> {
        let mut encoder = Encoder::new(
            config.sample_rate,
            opus_channels(config.channels)?,
            config.application.into(),
        )?;
        encoder.set_bitrate(Bitrate::Bits(config.bitrate))?;

        tracing::debug!(
            sample_rate = config.sample_rate,
            channels = config.channels,
            bitrate = config.bitrate,
            application = config.application.as_str(),
            frame_size = config.frame_size,
            "opus encoder ready"
        );

        Ok(Self {
            encoder,
            samples_per_frame: config.samples_per_frame(),
            max_packet_bytes: config.max_packet_bytes(),
        })
    }
}

impl FrameEncoder for OpusFrameEncoder {
    fn encode(&mut self, pcm: &[i16]) -> Result<Vec<u8>> {
        if pcm.len() != self.samples_per_frame {
            return Err(DcaError::Codec {
                message: format!(
                    "expected {} samples per frame, got {}",
                    self.samples_per_frame,
                    pcm.len()
                ),
            });
        }
        Ok(self.encoder.encode_vec(pcm, self.max_packet_bytes)?)
    }
}

/// Opus decoder configured once for a single run.
pub struct OpusFrameDecoder {
    decoder: Decoder,
    channels: usize,
    samples_per_frame: usize,
}

impl OpusFrameDecoder {
    pub fn new(config: &CodecConfig) -> Result<Self> {
        let decoder = Decoder::new(config.sample_rate, opus_channels(config.channels)?)?;
        Ok(Self {
            decoder,
            channels: usize::from(config.channels),
            samples_per_frame: config.samples_per_frame(),
        })
    }
}

impl FrameDecoder for OpusFrameDecoder {
    fn decode(&mut self, packet: &[u8]) -> Result<Vec<i16>> {
        let mut pcm = vec![0i16; self.samples_per_frame];
        let decoded = self.decoder.decode(packet, &mut pcm, false)?;
        pcm.truncate(decoded * self.channels);
        Ok(pcm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Application;

    fn stereo_48k() -> CodecConfig {
        CodecConfig::new(48000, 2, 960, 64, Application::Audio).unwrap()
    }

    #[test]
    fn encodes_silence_to_small_packet() {
        let config = stereo_48k();
        let mut encoder = OpusFrameEncoder::new(&config).unwrap();

        let packet = encoder.encode(&vec![0i16; 1920]).unwrap();

        assert!(!packet.is_empty());
        assert!(packet.len() <= config.max_packet_bytes());
    }

    #[test]
    fn rejects_short_frame() {
        let mut encoder = OpusFrameEncoder::new(&stereo_48k()).unwrap();

        let err = encoder.encode(&[0i16; 100]).unwrap_err();

        assert!(matches!(err, DcaError::Codec { .. }));
        assert!(err.to_string().contains("expected 1920 samples"));
    }

    #[test]
    fn decode_yields_full_frame() {
        let config = stereo_48k();
        let mut encoder = OpusFrameEncoder::new(&config).unwrap();
        let mut decoder = OpusFrameDecoder::new(&config).unwrap();

        let packet = encoder.encode(&vec![0i16; 1920]).unwrap();
        let pcm = decoder.decode(&packet).unwrap();

        assert_eq!(pcm.len(), 1920);
    }

    #[test]
    fn mono_frame_size_follows_channels() {
        let config = CodecConfig::new(16000, 1, 960, 32, Application::Voip).unwrap();
        let mut encoder = OpusFrameEncoder::new(&config).unwrap();
        let mut decoder = OpusFrameDecoder::new(&config).unwrap();

        let packet = encoder.encode(&vec![0i16; 960]).unwrap();

        assert_eq!(decoder.decode(&packet).unwrap().len(), 960);
    }

    #[test]
    fn garbage_packet_is_codec_error() {
        let mut decoder = OpusFrameDecoder::new(&stereo_48k()).unwrap();

        // TOC byte announcing a code-3 packet with an impossible frame count.
        let result = decoder.decode(&[0xFF, 0xFF]);

        assert!(matches!(result, Err(DcaError::Codec { .. })));
    }
}
