//! Playback sample-format negotiation and sample decoding
//!
//! The sink consumes raw interleaved sample bytes in whatever layout the
//! WAV stream uses; [`SampleLayout`] enumerates the layouts the sink
//! understands and how each one decodes to a normalized f32 for the
//! output device. Resolution failure is fatal for the whole playback
//! operation, reported before any audio is written.

use crate::wav::{SampleEncoding, WavFormat};

/// On-wire sample layouts the playback sink accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleLayout {
    /// Unsigned 8-bit PCM
    U8,
    /// Signed 16-bit little-endian PCM
    S16Le,
    /// Signed 24-bit little-endian PCM, packed in 3 bytes
    S24Le,
    /// Signed 24-bit little-endian PCM in the low bytes of a 32-bit word
    S24In32Le,
    /// Signed 32-bit little-endian PCM
    S32Le,
    /// IEEE 32-bit little-endian float
    F32Le,
    /// G.711 A-law companded, one byte per sample
    ALaw,
    /// G.711 µ-law companded, one byte per sample
    MuLaw,
}

impl SampleLayout {
    /// Map a decoded stream format to a sink layout.
    ///
    /// Returns `None` when no layout matches the encoding / container
    /// width / valid width combination; the caller must treat that as
    /// fatal for the stream.
    pub fn resolve(format: &WavFormat) -> Option<Self> {
        let bits = format.bits_per_sample;
        let valid = format.valid_bits_per_sample;

        match format.encoding {
            SampleEncoding::Pcm => match (bits, valid) {
                (8, 8) => Some(SampleLayout::U8),
                (16, 16) => Some(SampleLayout::S16Le),
                (24, 24) => Some(SampleLayout::S24Le),
                (32, 32) => Some(SampleLayout::S32Le),
                (32, 24) => Some(SampleLayout::S24In32Le),
                _ => None,
            },
            SampleEncoding::IeeeFloat => (bits == 32 && valid == 32).then_some(SampleLayout::F32Le),
            SampleEncoding::ALaw => (bits == 8 && valid == 8).then_some(SampleLayout::ALaw),
            SampleEncoding::MuLaw => (bits == 8 && valid == 8).then_some(SampleLayout::MuLaw),
        }
    }

    /// Container width of one sample in bytes.
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            SampleLayout::U8 | SampleLayout::ALaw | SampleLayout::MuLaw => 1,
            SampleLayout::S16Le => 2,
            SampleLayout::S24Le => 3,
            SampleLayout::S24In32Le | SampleLayout::S32Le | SampleLayout::F32Le => 4,
        }
    }

    /// Decode one sample from its container bytes to a normalized f32.
    ///
    /// `bytes` must be exactly `bytes_per_sample()` long.
    pub fn decode(&self, bytes: &[u8]) -> f32 {
        match self {
            SampleLayout::U8 => (f32::from(bytes[0]) - 128.0) / 128.0,
            SampleLayout::S16Le => {
                f32::from(i16::from_le_bytes([bytes[0], bytes[1]])) / 32768.0
            }
            SampleLayout::S24Le => {
                let wide = i32::from_le_bytes([0, bytes[0], bytes[1], bytes[2]]) >> 8;
                wide as f32 / 8_388_608.0
            }
            SampleLayout::S24In32Le => {
                // 24 valid bits in the low bytes of the 32-bit word
                let word = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                ((word << 8) >> 8) as f32 / 8_388_608.0
            }
            SampleLayout::S32Le => {
                let word = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                word as f32 / 2_147_483_648.0
            }
            SampleLayout::F32Le => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            SampleLayout::ALaw => f32::from(alaw_expand(bytes[0])) / 32768.0,
            SampleLayout::MuLaw => f32::from(mulaw_expand(bytes[0])) / 32768.0,
        }
    }
}

/// G.711 A-law expansion to a linear 16-bit sample.
fn alaw_expand(value: u8) -> i16 {
    let value = value ^ 0x55;
    let segment = (value & 0x70) >> 4;
    let mut magnitude = i16::from(value & 0x0F) << 4;

    match segment {
        0 => magnitude += 0x8,
        1 => magnitude += 0x108,
        _ => {
            magnitude += 0x108;
            magnitude <<= segment - 1;
        }
    }

    if value & 0x80 != 0 {
        magnitude
    } else {
        -magnitude
    }
}

/// G.711 µ-law expansion to a linear 16-bit sample.
fn mulaw_expand(value: u8) -> i16 {
    const BIAS: i16 = 0x84;

    let value = !value;
    let segment = (value & 0x70) >> 4;
    let magnitude = ((i16::from(value & 0x0F) << 3) + BIAS) << segment;

    if value & 0x80 != 0 {
        BIAS - magnitude
    } else {
        magnitude - BIAS
    }
}
