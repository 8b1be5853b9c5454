//! RIFF/WAVE container parsing
//!
//! [`WavReader`] opens a seekable byte stream, validates the container,
//! and exposes the decoded [`WavFormat`] plus sequential fixed-size
//! sample-block reads.

pub mod fields;
pub mod format;
pub mod reader;

pub use format::{
    SampleEncoding, WavFormat, CHANNEL_MASK_5_1, CHANNEL_MASK_MONO, CHANNEL_MASK_STEREO,
    CHANNEL_MASK_UNSET,
};
pub use reader::{BlockRead, WavReader};
