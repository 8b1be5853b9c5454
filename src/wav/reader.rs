//! RIFF/WAVE container parsing and sequential block reads
//!
//! Validates the RIFF/WAVE envelope, walks sub-chunks until the `data`
//! chunk, recovers the stream format from the `fmt ` chunk (including
//! WAVE_FORMAT_EXTENSIBLE resolution), and exposes a cursor for fixed-size
//! sample-block reads.
//!
//! Chunk tags are not required in any fixed order beyond `fmt ` becoming
//! known before sample reads begin; vendor metadata chunks (`LIST`, `fact`,
//! `JUNK`, ...) are skipped generically by their declared size.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::wav::fields::FieldReader;
use crate::wav::format::{
    SampleEncoding, WavFormat, CHANNEL_MASK_MONO, CHANNEL_MASK_STEREO, CHANNEL_MASK_UNSET,
};

/// Trailing 14 bytes of the Microsoft extensible sub-format GUID family.
/// Vendor-specific GUIDs are not understood.
const SUB_FORMAT_GUID_SUFFIX: [u8; 14] = [
    0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71,
];

/// Outcome of a sample-block read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRead {
    /// The destination holds exactly one sample block.
    Filled,
    /// Zero bytes were available; the stream ended at a block boundary.
    EndOfStream,
}

/// Fields recovered from one `fmt ` chunk. A later `fmt ` chunk
/// overwrites an earlier one (last-write-wins); the channel mask is
/// carried separately because only an extension block writes it.
struct ParsedFmt {
    encoding: SampleEncoding,
    channels: u16,
    sample_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
    valid_bits_per_sample: u16,
}

/// An open WAV stream: decoded format plus a cursor positioned at the
/// first sample byte.
pub struct WavReader<R> {
    fields: FieldReader<R>,
    format: WavFormat,
}

impl WavReader<BufReader<File>> {
    /// Open a WAV file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> WavReader<R> {
    /// Validate the container and consume header chunks up to and
    /// including the `data` chunk header. On return the cursor is
    /// positioned at the first sample byte.
    ///
    /// # Errors
    /// - [`Error::TagMismatch`] when the RIFF or WAVE tag is wrong
    /// - [`Error::NoFormatChunk`] when `data` is reached with no `fmt `
    /// - [`Error::UnsupportedFormat`] for unknown format tags, vendor
    ///   sub-format GUIDs, or an inconsistent avg-bytes-per-second field
    /// - [`Error::UnexpectedEof`] when a header field is truncated
    pub fn new(reader: R) -> Result<Self> {
        let mut fields = FieldReader::new(reader);
        let format = read_header(&mut fields)?;

        debug!(
            channels = format.channels,
            sample_rate = format.sample_rate,
            bits = format.bits_per_sample,
            "opened WAV stream"
        );

        Ok(Self { fields, format })
    }

    /// Decoded stream format.
    pub fn format(&self) -> &WavFormat {
        &self.format
    }

    /// Read exactly one sample block (`block_align` bytes) into `dest`.
    ///
    /// `dest` must be exactly `block_align` bytes long.
    ///
    /// Returns [`BlockRead::EndOfStream`] only when zero bytes could be
    /// read at physical EOF. A stream that ends mid-block is an I/O error,
    /// never a short fill.
    pub fn read_block(&mut self, dest: &mut [u8]) -> Result<BlockRead> {
        debug_assert_eq!(dest.len(), usize::from(self.format.block_align));

        let mut filled = 0;
        while filled < dest.len() {
            let n = self.fields.read_some(&mut dest[filled..])?;
            if n == 0 {
                if filled == 0 {
                    return Ok(BlockRead::EndOfStream);
                }
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "stream truncated inside a sample block",
                )));
            }
            filled += n;
        }

        Ok(BlockRead::Filled)
    }
}

/// Walk the container from the start: RIFF envelope, then chunks until
/// `data`. Unknown chunks are consumed by their declared size.
fn read_header<R: Read + Seek>(fields: &mut FieldReader<R>) -> Result<WavFormat> {
    fields.expect_tag("RIFF")?;
    // Master chunk size: read and discarded, not validated against the
    // actual stream length.
    fields.read_u32_le("RIFF chunk size")?;
    fields.expect_tag("WAVE")?;

    let mut fmt: Option<ParsedFmt> = None;
    let mut channel_mask = CHANNEL_MASK_UNSET;

    let data_length = loop {
        let tag = fields.read_tag("chunk tag")?;
        match &tag {
            b"fmt " => {
                fmt = Some(read_fmt_chunk(fields, &mut channel_mask)?);
            }
            b"data" => {
                break fields.read_u32_le("data chunk size")?;
            }
            _ => {
                let size = fields.read_u32_le("chunk size")?;
                debug!(
                    tag = %String::from_utf8_lossy(&tag),
                    size,
                    "skipping unknown chunk"
                );
                fields.skip(size)?;
            }
        }
    };

    let fmt = fmt.ok_or(Error::NoFormatChunk)?;

    // Streams without an extension block get a positional mask inferred
    // for mono and stereo; any other channel count keeps the sentinel.
    if channel_mask == CHANNEL_MASK_UNSET {
        channel_mask = match fmt.channels {
            1 => CHANNEL_MASK_MONO,
            2 => CHANNEL_MASK_STEREO,
            _ => CHANNEL_MASK_UNSET,
        };
    }

    Ok(WavFormat {
        encoding: fmt.encoding,
        channels: fmt.channels,
        sample_rate: fmt.sample_rate,
        block_align: fmt.block_align,
        bits_per_sample: fmt.bits_per_sample,
        valid_bits_per_sample: fmt.valid_bits_per_sample,
        channel_mask,
        data_length,
    })
}

/// Parse one `fmt ` chunk body (the tag itself has already been consumed).
///
/// Field layout, in order: chunk size (u32), format tag (u16), channel
/// count (u16), sample rate (u32), average bytes per second (u32), block
/// align (u16), bits per sample (u16). A chunk size above 16 carries an
/// extension: extension size (u16), and when nonzero, valid bits per
/// sample (u16), channel mask (u32), sub-format GUID (16 bytes).
fn read_fmt_chunk<R: Read + Seek>(
    fields: &mut FieldReader<R>,
    channel_mask: &mut u32,
) -> Result<ParsedFmt> {
    let chunk_size = fields.read_u32_le("fmt chunk size")?;
    let format_tag = fields.read_u16_le("format tag")?;
    let channels = fields.read_u16_le("channel count")?;
    let sample_rate = fields.read_u32_le("sample rate")?;
    let avg_bytes_per_sec = fields.read_u32_le("average bytes per second")?;
    let block_align = fields.read_u16_le("block align")?;
    let bits_per_sample = fields.read_u16_le("bits per sample")?;

    let mut valid_bits_per_sample = bits_per_sample;
    // Zero-initialized: an extensible format tag with no extension block
    // resolves sub-format 0x0000, which is unsupported.
    let mut sub_format = [0u8; 16];

    if chunk_size > 16 {
        let extension_size = fields.read_u16_le("extension size")?;
        if extension_size > 0 {
            valid_bits_per_sample = fields.read_u16_le("valid bits per sample")?;
            *channel_mask = fields.read_u32_le("channel mask")?;
            fields.read_bytes(&mut sub_format, "sub-format GUID")?;

            if sub_format[2..] != SUB_FORMAT_GUID_SUFFIX {
                return Err(Error::UnsupportedFormat(
                    "sub-format GUID is not in the Microsoft extensible family".into(),
                ));
            }
        }
    }

    let encoding = match format_tag {
        // WAVE_FORMAT_EXTENSIBLE: the true codec tag is the first two
        // bytes of the sub-format GUID.
        0xFFFE => {
            let sub_tag = u16::from_le_bytes([sub_format[0], sub_format[1]]);
            SampleEncoding::from_tag(sub_tag).ok_or_else(|| {
                Error::UnsupportedFormat(format!("extensible sub-format tag {sub_tag:#06x}"))
            })?
        }
        tag => SampleEncoding::from_tag(tag)
            .ok_or_else(|| Error::UnsupportedFormat(format!("format tag {tag:#06x}")))?,
    };

    // The average-bytes-per-second field is otherwise unused, so verify it
    // against block_align * sample_rate to catch corrupt headers.
    // Wrapping multiply matches the unsigned 32-bit arithmetic of the
    // on-disk fields.
    if avg_bytes_per_sec != u32::from(block_align).wrapping_mul(sample_rate) {
        return Err(Error::UnsupportedFormat(format!(
            "average bytes per second {avg_bytes_per_sec} does not equal block_align ({block_align}) * sample_rate ({sample_rate})"
        )));
    }

    Ok(ParsedFmt {
        encoding,
        channels,
        sample_rate,
        block_align,
        bits_per_sample,
        valid_bits_per_sample,
    })
}
