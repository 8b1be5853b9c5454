//! 5.1-to-stereo downmixing
//!
//! Rewrites one 6-channel interleaved PCM sample block into a 2-channel
//! block in place: the new left channel is the truncating integer average
//! of front-left, front-center, low-frequency, and the left surround
//! channel; the new right channel averages front-right, front-center,
//! low-frequency, and the right surround channel.
//!
//! Only integer PCM at byte widths 2, 3, and 4 is supported. Whether a
//! stream is downmixed at all is a static, whole-stream decision made
//! once after parsing; see [`eligible`].

use crate::error::{Error, Result};
use crate::wav::{SampleEncoding, WavFormat, CHANNEL_MASK_5_1};

/// Source channel indices in the canonical 5.1 interleaving
/// (channels follow mask bit order, so the surround pair is side-left
/// and side-right).
const FRONT_LEFT: usize = 0;
const FRONT_RIGHT: usize = 1;
const FRONT_CENTER: usize = 2;
const LOW_FREQUENCY: usize = 3;
const SIDE_LEFT: usize = 4;
const SIDE_RIGHT: usize = 5;

/// Whether a stream qualifies for 5.1-to-stereo downmixing: exactly six
/// channels, the canonical 5.1 speaker mask, and integer PCM encoding.
///
/// A correctly-masked 5.1 stream in float or companded encoding does not
/// qualify; such streams are forwarded unchanged.
pub fn eligible(format: &WavFormat) -> bool {
    format.channels == 6
        && format.channel_mask == CHANNEL_MASK_5_1
        && format.encoding == SampleEncoding::Pcm
}

/// Per-block 5.1-to-stereo converter for one stream.
///
/// Encoding and byte width are validated once at construction, so the
/// per-block transform cannot fail mid-stream: a stream either downmixes
/// from the first block or is rejected before any audio plays.
pub struct Downmixer {
    /// Container byte width of one sample (2, 3, or 4)
    width: usize,
}

impl Downmixer {
    /// Build a downmixer for `format`.
    ///
    /// # Errors
    /// [`Error::UnsupportedFormat`] when the encoding is not integer PCM,
    /// the sample byte width is not 2, 3, or 4, or the block alignment
    /// disagrees with six samples of that width.
    pub fn new(format: &WavFormat) -> Result<Self> {
        if format.encoding != SampleEncoding::Pcm {
            return Err(Error::UnsupportedFormat(format!(
                "downmixing requires integer PCM, stream is {}",
                format.encoding
            )));
        }

        let width = usize::from(format.bytes_per_sample());
        if !(2..=4).contains(&width) {
            return Err(Error::UnsupportedFormat(format!(
                "downmixing does not support {width}-byte samples"
            )));
        }

        // The in-place transform indexes six samples of `width` bytes;
        // a block_align that disagrees with the sample width is corrupt.
        if usize::from(format.block_align) != 6 * width {
            return Err(Error::UnsupportedFormat(format!(
                "block alignment {} does not hold six {width}-byte samples",
                format.block_align
            )));
        }

        Ok(Self { width })
    }

    /// Downmix one 6-channel sample block in place.
    ///
    /// The two output samples are written at the start of `block`;
    /// everything beyond the returned length is stale for this block.
    ///
    /// # Returns
    /// The new occupied length in bytes (`2 * width`).
    pub fn process(&self, block: &mut [u8]) -> usize {
        let w = self.width;
        debug_assert!(block.len() >= 6 * w);

        let mut samples = [0i64; 6];
        for (ch, sample) in samples.iter_mut().enumerate() {
            *sample = decode_sample(&block[ch * w..(ch + 1) * w]);
        }

        // Truncating division toward zero, matching signed integer
        // division semantics.
        let left = (samples[FRONT_LEFT]
            + samples[FRONT_CENTER]
            + samples[LOW_FREQUENCY]
            + samples[SIDE_LEFT])
            / 4;
        let right = (samples[FRONT_RIGHT]
            + samples[FRONT_CENTER]
            + samples[LOW_FREQUENCY]
            + samples[SIDE_RIGHT])
            / 4;

        encode_sample(left, &mut block[..w]);
        encode_sample(right, &mut block[w..2 * w]);

        2 * w
    }
}

/// Decode one little-endian two's-complement sample of 2, 3, or 4 bytes
/// into a sign-extended i64.
fn decode_sample(bytes: &[u8]) -> i64 {
    match *bytes {
        [b0, b1] => i64::from(i16::from_le_bytes([b0, b1])),
        [b0, b1, b2] => {
            // Place the 24-bit value in the upper bytes of an i32, then
            // arithmetic-shift back down to sign-extend.
            let wide = i32::from_le_bytes([0, b0, b1, b2]);
            i64::from(wide >> 8)
        }
        [b0, b1, b2, b3] => i64::from(i32::from_le_bytes([b0, b1, b2, b3])),
        _ => unreachable!("sample width validated at construction"),
    }
}

/// Encode the low `out.len()` bytes of a sample back into its
/// little-endian container.
fn encode_sample(value: i64, out: &mut [u8]) {
    let bytes = value.to_le_bytes();
    out.copy_from_slice(&bytes[..out.len()]);
}
