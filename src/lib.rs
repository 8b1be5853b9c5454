//! # wavplay
//!
//! Decode a RIFF/WAVE file into a sequential stream of fixed-size sample
//! blocks and play them through an audio output device, downmixing
//! canonical 5.1 integer PCM to stereo block-by-block as it is read.
//!
//! **Architecture:** a synchronous pull pipeline: [`wav::WavReader`]
//! (container parsing and block reads) feeds [`downmix::Downmixer`]
//! (optional in-place 5.1-to-stereo transform), which feeds
//! [`audio::AudioOutput`] (cpal playback sink).

pub mod audio;
pub mod downmix;
pub mod error;
pub mod player;
pub mod wav;

pub use error::{Error, Result};
