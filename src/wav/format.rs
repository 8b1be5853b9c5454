//! Decoded WAV stream format
//!
//! The descriptor recovered from the `fmt ` chunk, plus the channel-mask
//! constants and speaker-position names used for downmix eligibility and
//! the human-readable stream summary.

use std::fmt;
use std::time::Duration;

/// Sentinel meaning "no extension block supplied a channel mask".
///
/// Left in place for channel counts other than 1 and 2; it can never equal
/// a real positional mask, so mask-dependent logic simply never matches.
pub const CHANNEL_MASK_UNSET: u32 = 0x8000_0000;

/// Fallback mask for mono streams (FRONT_CENTER).
pub const CHANNEL_MASK_MONO: u32 = 0x0000_0004;

/// Fallback mask for stereo streams (FRONT_LEFT | FRONT_RIGHT).
pub const CHANNEL_MASK_STEREO: u32 = 0x0000_0003;

/// The canonical 5.1 layout: front-left, front-right, front-center,
/// low-frequency, and the side-left/side-right surround pair
/// (mask bits 0-3, 9, 10).
pub const CHANNEL_MASK_5_1: u32 = 0x0000_060F;

/// Microsoft SPEAKER_* position names, in mask bit order.
const SPEAKER_POSITIONS: [&str; 18] = [
    "FRONT_LEFT",
    "FRONT_RIGHT",
    "FRONT_CENTER",
    "LOW_FREQUENCY",
    "BACK_LEFT",
    "BACK_RIGHT",
    "FRONT_LEFT_OF_CENTER",
    "FRONT_RIGHT_OF_CENTER",
    "BACK_CENTER",
    "SIDE_LEFT",
    "SIDE_RIGHT",
    "TOP_CENTER",
    "TOP_FRONT_LEFT",
    "TOP_FRONT_CENTER",
    "TOP_FRONT_RIGHT",
    "TOP_BACK_LEFT",
    "TOP_BACK_CENTER",
    "TOP_BACK_RIGHT",
];

/// Sample encoding recovered from the format tag (or, for extensible
/// streams, from the sub-format GUID).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    /// Integer PCM (format tag 0x0001)
    Pcm,
    /// IEEE floating point (format tag 0x0003)
    IeeeFloat,
    /// A-law companded (format tag 0x0006)
    ALaw,
    /// µ-law companded (format tag 0x0007)
    MuLaw,
}

impl SampleEncoding {
    /// Resolve a WAV format tag to an encoding. Applies both to the
    /// primary format tag and to the first two bytes of an extensible
    /// sub-format GUID.
    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            0x0001 => Some(SampleEncoding::Pcm),
            0x0003 => Some(SampleEncoding::IeeeFloat),
            0x0006 => Some(SampleEncoding::ALaw),
            0x0007 => Some(SampleEncoding::MuLaw),
            _ => None,
        }
    }
}

impl fmt::Display for SampleEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleEncoding::Pcm => "PCM",
            SampleEncoding::IeeeFloat => "IEEE float",
            SampleEncoding::ALaw => "A-law",
            SampleEncoding::MuLaw => "µ-law",
        };
        f.write_str(name)
    }
}

/// Decoded, validated format of an open WAV stream.
///
/// Constructed once while consuming header chunks; never mutated afterwards
/// except for the mono/stereo channel-mask fallback applied at open time.
#[derive(Debug, Clone)]
pub struct WavFormat {
    /// Sample encoding (PCM, float, A-law, µ-law)
    pub encoding: SampleEncoding,

    /// Number of interleaved channels
    pub channels: u16,

    /// Samples per second per channel
    pub sample_rate: u32,

    /// Bytes per sample block (one sample across all channels).
    /// Trusted from the header; used as the read stride.
    pub block_align: u16,

    /// Container width of one sample in bits (8/16/24/32)
    pub bits_per_sample: u16,

    /// Meaningful bits inside the container (e.g. 24-in-32).
    /// Equals `bits_per_sample` when no extension block is present.
    pub valid_bits_per_sample: u16,

    /// Positional speaker assignment bitmask, or [`CHANNEL_MASK_UNSET`]
    pub channel_mask: u32,

    /// Byte length of the audio payload, from the data chunk header.
    /// Used for duration display only; reads stop at physical EOF.
    pub data_length: u32,
}

impl WavFormat {
    /// Container width of one sample in bytes.
    pub fn bytes_per_sample(&self) -> u16 {
        self.bits_per_sample / 8
    }

    /// Payload duration computed from `data_length`.
    ///
    /// Returns zero when the header fields would make the divisor zero.
    pub fn duration(&self) -> Duration {
        let bytes_per_sec =
            u64::from(self.bytes_per_sample()) * u64::from(self.sample_rate) * u64::from(self.channels);
        if bytes_per_sec == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs(u64::from(self.data_length) / bytes_per_sec)
    }

    /// Names of the speaker positions set in the channel mask,
    /// in mask bit order.
    pub fn speaker_positions(&self) -> Vec<&'static str> {
        SPEAKER_POSITIONS
            .iter()
            .enumerate()
            .filter(|(bit, _)| (self.channel_mask >> bit) & 1 == 1)
            .map(|(_, name)| *name)
            .collect()
    }
}

impl fmt::Display for WavFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{{")?;
        writeln!(f, "\tformat                = {}", self.encoding)?;
        writeln!(f, "\tchannels              = {}", self.channels)?;
        writeln!(f, "\tsample_rate           = {}", self.sample_rate)?;
        writeln!(f, "\tblock_align           = {}", self.block_align)?;
        writeln!(f, "\tbits_per_sample       = {}", self.bits_per_sample)?;
        writeln!(f, "\tvalid_bits_per_sample = {}", self.valid_bits_per_sample)?;

        writeln!(f, "\tchannel_mask          =")?;
        for (i, name) in self.speaker_positions().iter().enumerate() {
            writeln!(f, "\t\t{i:2}: {name}")?;
        }

        let total = self.duration().as_secs();
        let (hours, minutes, seconds) = (total / 3600, (total / 60) % 60, total % 60);
        writeln!(f, "\tlength                = {hours:02}:{minutes:02}:{seconds:02}")?;
        write!(f, "}}")
    }
}
