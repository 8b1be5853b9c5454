//! Error types for wavplay
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for wavplay
#[derive(Error, Debug)]
pub enum Error {
    /// Read/seek failure from the underlying transport.
    ///
    /// Carries the OS error; `raw_os_error()` is available for diagnostics.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required field or chunk could not be fully read before EOF.
    /// Carries the name of the field that was being read.
    #[error("unexpected end of stream while reading {0}")]
    UnexpectedEof(&'static str),

    /// A fixed literal tag (RIFF or WAVE) did not match the stream bytes.
    #[error("expected `{expected}` tag, found `{found}`")]
    TagMismatch { expected: String, found: String },

    /// A tag match was requested against a literal that is not exactly
    /// 4 bytes long. This is a caller contract violation, not a data error.
    #[error("tag match literal must be exactly 4 bytes, got `{0}`")]
    InvalidMatchArgument(String),

    /// Unrecognized format tag, unrecognized extensible sub-format GUID,
    /// inconsistent header fields, or an unsupported downmix byte width.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A data chunk was reached before any fmt chunk was seen.
    #[error("no fmt chunk found before data chunk")]
    NoFormatChunk,

    /// Audio output device errors
    #[error("audio output error: {0}")]
    AudioOutput(String),
}

/// Convenience Result type using wavplay Error
pub type Result<T> = std::result::Result<T, Error>;
