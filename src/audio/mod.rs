//! Playback sink: sample-format negotiation and cpal device output

pub mod format;
pub mod output;

pub use format::SampleLayout;
pub use output::AudioOutput;
