//! Transformer stations wrapping the codec adapter.

use crate::codec::{FrameDecoder, FrameEncoder};
use crate::error::Result;
use crate::pipeline::station::Station;
use crate::pipeline::types::{OpusFrame, PcmFrame};

/// PCM in, Opus packet out.
pub struct EncoderStation {
    encoder: Box<dyn FrameEncoder>,
}

impl EncoderStation {
    pub fn new(encoder: Box<dyn FrameEncoder>) -> Self {
        Self { encoder }
    }
}

impl Station for EncoderStation {
    type Input = PcmFrame;
    type Output = OpusFrame;

    fn process(&mut self, input: PcmFrame) -> Result<OpusFrame> {
        let packet = self.encoder.encode(&input.samples)?;
        OpusFrame::new(packet, input.sequence)
    }

    fn name(&self) -> &'static str {
        "encoder"
    }
}

/// Opus packet in, PCM out.
pub struct DecoderStation {
    decoder: Box<dyn FrameDecoder>,
}

impl DecoderStation {
    pub fn new(decoder: Box<dyn FrameDecoder>) -> Self {
        Self { decoder }
    }
}

impl Station for DecoderStation {
    type Input = OpusFrame;
    type Output = PcmFrame;

    fn process(&mut self, input: OpusFrame) -> Result<PcmFrame> {
        let samples = self.decoder.decode(input.payload())?;
        Ok(PcmFrame::new(samples, input.sequence()))
    }

    fn name(&self) -> &'static str {
        "decoder"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DcaError;

    struct OversizedEncoder;

    impl FrameEncoder for OversizedEncoder {
        fn encode(&mut self, _pcm: &[i16]) -> Result<Vec<u8>> {
            Ok(vec![0; 70_000])
        }
    }

    struct EchoDecoder;

    impl FrameDecoder for EchoDecoder {
        fn decode(&mut self, packet: &[u8]) -> Result<Vec<i16>> {
            Ok(packet.iter().map(|&b| i16::from(b)).collect())
        }
    }

    #[test]
    fn oversized_packet_is_rejected() {
        let mut station = EncoderStation::new(Box::new(OversizedEncoder));

        let err = station.process(PcmFrame::new(vec![0; 4], 0)).unwrap_err();

        assert!(matches!(err, DcaError::FrameTooLarge { len: 70_000 }));
    }

    #[test]
    fn decoder_keeps_sequence() {
        let mut station = DecoderStation::new(Box::new(EchoDecoder));

        let frame = station
            .process(OpusFrame::new(vec![1, 2], 41).unwrap())
            .unwrap();

        assert_eq!(frame.samples, vec![1, 2]);
        assert_eq!(frame.sequence, 41);
    }
}
