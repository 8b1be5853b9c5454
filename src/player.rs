//! Playback loop
//!
//! Single-threaded, pull-based: read one sample block, downmix it in place
//! when the stream qualifies, and forward batches of blocks to the sink.
//! A cancellation flag is checked between blocks; on cancellation the loop
//! stops reading and the sink is dropped without draining.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::audio::{AudioOutput, SampleLayout};
use crate::downmix::{self, Downmixer};
use crate::error::{Error, Result};
use crate::wav::{BlockRead, WavReader};

/// Batch buffer size in bytes; blocks are accumulated here before each
/// sink write.
const BATCH_BUFFER_BYTES: usize = 1024;

/// Play a WAV file to completion (or cancellation).
///
/// # Arguments
/// - `path`: the WAV file to play
/// - `device`: optional output device name (None = default device)
/// - `cancel`: cooperative cancellation flag, checked between blocks
pub fn play_file(path: &Path, device: Option<&str>, cancel: &AtomicBool) -> Result<()> {
    let mut wav = WavReader::open(path)?;
    let format = wav.format().clone();

    // Stream summary before negotiation, rendering owned here
    println!("{} {}", path.display(), format);

    let block_align = usize::from(format.block_align);
    if block_align == 0 || block_align > BATCH_BUFFER_BYTES {
        return Err(Error::UnsupportedFormat(format!(
            "block alignment {block_align} is outside the playable range"
        )));
    }

    // Static whole-stream decision: a 6-channel stream with the canonical
    // 5.1 mask and integer PCM encoding is downmixed; everything else is
    // forwarded unchanged.
    let downmixer = if downmix::eligible(&format) {
        info!("downmixing 5.1 to stereo");
        Some(Downmixer::new(&format)?)
    } else {
        None
    };

    let layout = SampleLayout::resolve(&format).ok_or_else(|| {
        Error::UnsupportedFormat(format!(
            "no playback sample layout for {} at {} bits ({} valid)",
            format.encoding, format.bits_per_sample, format.valid_bits_per_sample
        ))
    })?;

    let channels = if downmixer.is_some() { 2 } else { format.channels };
    let mut sink = AudioOutput::open(device, layout, channels, format.sample_rate)?;

    let mut buffer = [0u8; BATCH_BUFFER_BYTES];
    let mut more_data = true;

    while more_data {
        let mut offset = 0;

        while BATCH_BUFFER_BYTES - offset >= block_align {
            if cancel.load(Ordering::SeqCst) {
                info!("playback interrupted");
                return Ok(());
            }

            match wav.read_block(&mut buffer[offset..offset + block_align])? {
                BlockRead::EndOfStream => {
                    more_data = false;
                    break;
                }
                BlockRead::Filled => {}
            }

            offset += match &downmixer {
                Some(mixer) => mixer.process(&mut buffer[offset..offset + block_align]),
                None => block_align,
            };
        }

        if offset == 0 {
            break;
        }

        sink.write(&buffer[..offset])?;
    }

    sink.drain()?;
    info!("playback finished");
    Ok(())
}
