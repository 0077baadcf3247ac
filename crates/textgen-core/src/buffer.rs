//! Bounded output-buffer adapter.

use crate::error::{EngineError, Result};

/// Wraps a caller-supplied byte buffer and enforces its capacity.
///
/// Text is only ever appended whole: an append that would overflow leaves
/// the buffer untouched and surfaces [`EngineError::BufferOverflow`], so
/// the capacity bound can never split a multi-byte UTF-8 code point.
pub struct OutputBuffer<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> OutputBuffer<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes written so far.
    pub fn written(&self) -> usize {
        self.len
    }

    /// Append `piece`, failing without partial writes when it does not fit.
    pub fn push_str(&mut self, piece: &str) -> Result<()> {
        let bytes = piece.as_bytes();
        if self.len + bytes.len() > self.buf.len() {
            return Err(EngineError::BufferOverflow {
                capacity: self.buf.len(),
            });
        }
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }

    /// Text written so far.
    ///
    /// Always valid UTF-8 because pieces are appended whole.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }
}
