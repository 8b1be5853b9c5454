//! Container parser integration tests
//!
//! Valid streams are generated with hound (a conforming encoder);
//! malformed and extensible streams are handcrafted byte vectors.

use std::io::Cursor;
use std::time::Duration;

use wavplay::downmix;
use wavplay::wav::{
    BlockRead, SampleEncoding, WavReader, CHANNEL_MASK_5_1, CHANNEL_MASK_MONO,
    CHANNEL_MASK_STEREO, CHANNEL_MASK_UNSET,
};
use wavplay::Error;

/// Trailing 14 bytes of the Microsoft extensible sub-format GUID family.
const GUID_SUFFIX: [u8; 14] = [
    0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71,
];

/// Wrap chunks in a RIFF/WAVE envelope.
fn riff(chunks: &[&[u8]]) -> Vec<u8> {
    let body_len: usize = 4 + chunks.iter().map(|c| c.len()).sum::<usize>();
    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(body_len as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    for chunk in chunks {
        out.extend_from_slice(chunk);
    }
    out
}

/// A plain 16-byte `fmt ` chunk with a consistent byte-rate field.
fn fmt_chunk(tag: u16, channels: u16, rate: u32, bits: u16) -> Vec<u8> {
    let block_align = channels * bits / 8;
    let avg = u32::from(block_align) * rate;
    fmt_chunk_with_avg(tag, channels, rate, bits, block_align, avg)
}

fn fmt_chunk_with_avg(
    tag: u16,
    channels: u16,
    rate: u32,
    bits: u16,
    block_align: u16,
    avg: u32,
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&tag.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&rate.to_le_bytes());
    out.extend_from_slice(&avg.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());
    out
}

/// A 40-byte extensible `fmt ` chunk (format tag 0xFFFE, extension size 22).
fn fmt_chunk_extensible(
    sub_tag: u16,
    channels: u16,
    rate: u32,
    bits: u16,
    valid_bits: u16,
    mask: u32,
    guid_suffix: &[u8; 14],
) -> Vec<u8> {
    let block_align = channels * bits / 8;
    let avg = u32::from(block_align) * rate;

    let mut out = Vec::new();
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&0xFFFEu16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&rate.to_le_bytes());
    out.extend_from_slice(&avg.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());
    out.extend_from_slice(&22u16.to_le_bytes());
    out.extend_from_slice(&valid_bits.to_le_bytes());
    out.extend_from_slice(&mask.to_le_bytes());
    out.extend_from_slice(&sub_tag.to_le_bytes());
    out.extend_from_slice(guid_suffix);
    out
}

fn data_chunk(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

fn open(bytes: Vec<u8>) -> wavplay::Result<WavReader<Cursor<Vec<u8>>>> {
    WavReader::new(Cursor::new(bytes))
}

#[test]
fn parses_hound_generated_pcm16_stereo() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..100i32 {
        let sample = (i * 300 - 15000) as i16;
        writer.write_sample(sample).unwrap();
        writer.write_sample(-sample).unwrap();
    }
    writer.finalize().unwrap();

    let mut wav = WavReader::open(&path).unwrap();
    let format = wav.format().clone();

    assert_eq!(format.encoding, SampleEncoding::Pcm);
    assert_eq!(format.channels, 2);
    assert_eq!(format.sample_rate, 44100);
    assert_eq!(format.bits_per_sample, 16);
    assert_eq!(format.valid_bits_per_sample, 16);
    assert_eq!(format.block_align, 4);
    assert_eq!(format.channel_mask, CHANNEL_MASK_STEREO);
    assert_eq!(format.data_length, 100 * 4);

    // 100 frames, then end-of-stream exactly at the block boundary
    let mut block = [0u8; 4];
    for _ in 0..100 {
        assert_eq!(wav.read_block(&mut block).unwrap(), BlockRead::Filled);
    }
    assert_eq!(wav.read_block(&mut block).unwrap(), BlockRead::EndOfStream);
}

#[test]
fn parses_hound_generated_float32() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("float.wav");

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 48000,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..32 {
        writer.write_sample(i as f32 / 32.0).unwrap();
    }
    writer.finalize().unwrap();

    let wav = WavReader::open(&path).unwrap();
    assert_eq!(wav.format().encoding, SampleEncoding::IeeeFloat);
    assert_eq!(wav.format().sample_rate, 48000);
    assert_eq!(wav.format().bits_per_sample, 32);
}

#[test]
fn mono_gets_front_center_fallback_mask() {
    let bytes = riff(&[&fmt_chunk(0x0001, 1, 8000, 16), &data_chunk(&[])]);
    let wav = open(bytes).unwrap();
    assert_eq!(wav.format().channel_mask, CHANNEL_MASK_MONO);
}

#[test]
fn four_channel_stream_keeps_the_unset_sentinel() {
    let bytes = riff(&[&fmt_chunk(0x0001, 4, 8000, 16), &data_chunk(&[])]);
    let wav = open(bytes).unwrap();

    let format = wav.format();
    assert_eq!(format.channel_mask, CHANNEL_MASK_UNSET);
    assert!(!downmix::eligible(format));
}

#[test]
fn rifx_container_fails_with_tag_mismatch() {
    let mut bytes = riff(&[&fmt_chunk(0x0001, 2, 44100, 16), &data_chunk(&[])]);
    bytes[..4].copy_from_slice(b"RIFX");

    let err = open(bytes).map(|_| ()).unwrap_err();
    match err {
        Error::TagMismatch { expected, found } => {
            assert_eq!(expected, "RIFF");
            assert_eq!(found, "RIFX");
        }
        other => panic!("expected TagMismatch, got {other:?}"),
    }
}

#[test]
fn truncation_inside_fmt_chunk_fails_with_eof() {
    let mut bytes = riff(&[&fmt_chunk(0x0001, 2, 44100, 16), &data_chunk(&[])]);
    bytes.truncate(20); // mid fmt chunk

    assert!(matches!(open(bytes), Err(Error::UnexpectedEof(_))));
}

#[test]
fn inconsistent_byte_rate_fails_as_unsupported() {
    let fmt = fmt_chunk_with_avg(0x0001, 2, 44100, 16, 4, 44100 * 4 + 1);
    let bytes = riff(&[&fmt, &data_chunk(&[])]);

    assert!(matches!(open(bytes), Err(Error::UnsupportedFormat(_))));
}

#[test]
fn data_before_fmt_fails_with_no_format_chunk() {
    let bytes = riff(&[&data_chunk(&[0u8; 8]), &fmt_chunk(0x0001, 2, 44100, 16)]);
    assert!(matches!(open(bytes), Err(Error::NoFormatChunk)));
}

#[test]
fn unknown_chunks_are_skipped_by_size() {
    let mut junk = Vec::new();
    junk.extend_from_slice(b"JUNK");
    junk.extend_from_slice(&6u32.to_le_bytes());
    junk.extend_from_slice(&[0xAB; 6]);

    let mut list = Vec::new();
    list.extend_from_slice(b"LIST");
    list.extend_from_slice(&3u32.to_le_bytes());
    list.extend_from_slice(b"abc");

    let payload = [1u8, 2, 3, 4];
    let bytes = riff(&[
        &junk,
        &fmt_chunk(0x0001, 2, 44100, 16),
        &list,
        &data_chunk(&payload),
    ]);

    let mut wav = open(bytes).unwrap();
    let mut block = [0u8; 4];
    assert_eq!(wav.read_block(&mut block).unwrap(), BlockRead::Filled);
    assert_eq!(block, payload);
}

#[test]
fn unknown_format_tag_fails_as_unsupported() {
    // 0x0002 is MS ADPCM, one of the many tags outside the PCM family
    let bytes = riff(&[&fmt_chunk(0x0002, 2, 44100, 16), &data_chunk(&[])]);
    assert!(matches!(open(bytes), Err(Error::UnsupportedFormat(_))));
}

#[test]
fn extensible_5_1_pcm_parses_and_qualifies_for_downmix() {
    let fmt = fmt_chunk_extensible(0x0001, 6, 48000, 16, 16, CHANNEL_MASK_5_1, &GUID_SUFFIX);
    let bytes = riff(&[&fmt, &data_chunk(&[0u8; 24])]);

    let wav = open(bytes).unwrap();
    let format = wav.format();

    assert_eq!(format.encoding, SampleEncoding::Pcm);
    assert_eq!(format.channels, 6);
    assert_eq!(format.channel_mask, CHANNEL_MASK_5_1);
    assert!(downmix::eligible(format));
}

#[test]
fn extensible_float_resolves_but_never_downmixes() {
    let fmt = fmt_chunk_extensible(0x0003, 6, 48000, 32, 32, CHANNEL_MASK_5_1, &GUID_SUFFIX);
    let bytes = riff(&[&fmt, &data_chunk(&[])]);

    let wav = open(bytes).unwrap();
    assert_eq!(wav.format().encoding, SampleEncoding::IeeeFloat);
    assert!(!downmix::eligible(wav.format()));
}

#[test]
fn vendor_sub_format_guid_fails_as_unsupported() {
    let mut vendor_suffix = GUID_SUFFIX;
    vendor_suffix[13] ^= 0xFF;

    let fmt = fmt_chunk_extensible(0x0001, 6, 48000, 16, 16, CHANNEL_MASK_5_1, &vendor_suffix);
    let bytes = riff(&[&fmt, &data_chunk(&[])]);

    assert!(matches!(open(bytes), Err(Error::UnsupportedFormat(_))));
}

#[test]
fn unknown_extensible_sub_format_fails_as_unsupported() {
    // sub-format 0x0002 carries the right GUID family but no known codec
    let fmt = fmt_chunk_extensible(0x0002, 2, 44100, 16, 16, CHANNEL_MASK_STEREO, &GUID_SUFFIX);
    let bytes = riff(&[&fmt, &data_chunk(&[])]);

    assert!(matches!(open(bytes), Err(Error::UnsupportedFormat(_))));
}

#[test]
fn second_fmt_chunk_overwrites_the_first() {
    let bytes = riff(&[
        &fmt_chunk(0x0001, 2, 44100, 16),
        &fmt_chunk(0x0001, 1, 8000, 8),
        &data_chunk(&[]),
    ]);

    let wav = open(bytes).unwrap();
    assert_eq!(wav.format().channels, 1);
    assert_eq!(wav.format().sample_rate, 8000);
    assert_eq!(wav.format().bits_per_sample, 8);
}

#[test]
fn reads_run_to_physical_eof_not_declared_length() {
    // declared data size is 100, actual payload is two blocks
    let mut data = Vec::new();
    data.extend_from_slice(b"data");
    data.extend_from_slice(&100u32.to_le_bytes());
    data.extend_from_slice(&[0u8; 8]);

    let bytes = riff(&[&fmt_chunk(0x0001, 2, 44100, 16), &data]);
    let mut wav = open(bytes).unwrap();
    assert_eq!(wav.format().data_length, 100);

    let mut block = [0u8; 4];
    assert_eq!(wav.read_block(&mut block).unwrap(), BlockRead::Filled);
    assert_eq!(wav.read_block(&mut block).unwrap(), BlockRead::Filled);
    assert_eq!(wav.read_block(&mut block).unwrap(), BlockRead::EndOfStream);
}

#[test]
fn truncation_mid_block_is_an_io_error_not_a_short_fill() {
    // 6 payload bytes with a 4-byte block align: one full block, then a
    // 2-byte remainder
    let bytes = riff(&[&fmt_chunk(0x0001, 2, 44100, 16), &data_chunk(&[0u8; 6])]);
    let mut wav = open(bytes).unwrap();

    let mut block = [0u8; 4];
    assert_eq!(wav.read_block(&mut block).unwrap(), BlockRead::Filled);
    assert!(matches!(wav.read_block(&mut block), Err(Error::Io(_))));
}

#[test]
fn duration_is_computed_from_the_data_chunk_size() {
    // 2 channels * 2 bytes * 44100 Hz = 176400 bytes/sec; 3 seconds
    let mut data = Vec::new();
    data.extend_from_slice(b"data");
    data.extend_from_slice(&(176400u32 * 3).to_le_bytes());

    let bytes = riff(&[&fmt_chunk(0x0001, 2, 44100, 16), &data]);
    let wav = open(bytes).unwrap();
    assert_eq!(wav.format().duration(), Duration::from_secs(3));
}
