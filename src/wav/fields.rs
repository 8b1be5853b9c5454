//! Little-endian field reads against a seekable byte stream
//!
//! The RIFF/WAVE header is parsed as an explicit ordered sequence of typed
//! field reads rather than a declarative struct layout, so the on-wire
//! byte widths and endianness stay visible at every call site.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{Error, Result};

/// Cursor for fixed-width little-endian field reads.
///
/// Distinguishes end-of-stream from transport failure: a read that comes up
/// short at physical EOF maps to [`Error::UnexpectedEof`] with the field
/// name as context, any other failure to [`Error::Io`] with the OS error.
pub struct FieldReader<R> {
    inner: R,
}

impl<R: Read + Seek> FieldReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Consume the cursor, returning the underlying stream positioned
    /// where the last field read left it.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill(&mut self, buf: &mut [u8], field: &'static str) -> Result<()> {
        self.inner.read_exact(buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::UnexpectedEof(field)
            } else {
                Error::Io(e)
            }
        })
    }

    /// Read a 2-byte little-endian unsigned integer.
    pub fn read_u16_le(&mut self, field: &'static str) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.fill(&mut buf, field)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Read a 4-byte little-endian unsigned integer.
    pub fn read_u32_le(&mut self, field: &'static str) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf, field)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Read a 4-byte chunk tag without validating it.
    pub fn read_tag(&mut self, field: &'static str) -> Result<[u8; 4]> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf, field)?;
        Ok(buf)
    }

    /// Read a 4-byte tag and require it to equal `literal`.
    ///
    /// # Errors
    /// - [`Error::InvalidMatchArgument`] if `literal` is not exactly 4 bytes
    /// - [`Error::TagMismatch`] if the stream bytes differ from `literal`
    pub fn expect_tag(&mut self, literal: &str) -> Result<()> {
        if literal.len() != 4 {
            return Err(Error::InvalidMatchArgument(literal.to_string()));
        }

        let tag = self.read_tag("chunk tag")?;
        if tag != literal.as_bytes() {
            return Err(Error::TagMismatch {
                expected: literal.to_string(),
                found: String::from_utf8_lossy(&tag).into_owned(),
            });
        }

        Ok(())
    }

    /// Read exactly `buf.len()` raw bytes.
    pub fn read_bytes(&mut self, buf: &mut [u8], field: &'static str) -> Result<()> {
        self.fill(buf, field)
    }

    /// Skip `n` bytes forward from the current position.
    pub fn skip(&mut self, n: u32) -> Result<()> {
        self.inner.seek(SeekFrom::Current(i64::from(n)))?;
        Ok(())
    }

    /// Read up to `buf.len()` bytes, returning the count read.
    /// Returns 0 only at physical end of stream.
    pub fn read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.inner.read(buf)?)
    }
}
