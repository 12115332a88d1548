//! Fixed-capacity read/write buffers (part of C4/C7).
//!
//! Unlike the growable `Buffer` a heap-backed implementation would reach
//! for, these are stack-sized arrays: a request larger than [`crate::READ_BUFFER_SIZE`]
//! or a response whose headers overflow [`crate::WRITE_BUFFER_SIZE`] is a hard
//! failure, not a reallocation (§9, "Fixed per-slot buffers").

use std::fmt;

use crate::{READ_BUFFER_SIZE, WRITE_BUFFER_SIZE};

/// The read side of a connection slot.
///
/// `read_idx` is the next free byte; everything before it has been filled
/// by the reactor's drain-read. The line scanner additionally tracks
/// `checked_idx` and `start_line`, which live on [`crate::parser::request::RequestParser`]
/// rather than here, since they are parse state, not buffer state.
pub struct ReadBuffer {
    data: [u8; READ_BUFFER_SIZE],
    read_idx: usize,
}

impl ReadBuffer {
    pub fn new() -> Self {
        ReadBuffer {
            data: [0u8; READ_BUFFER_SIZE],
            read_idx: 0,
        }
    }

    pub fn reset(&mut self) {
        self.read_idx = 0;
    }

    pub fn read_idx(&self) -> usize {
        self.read_idx
    }

    pub fn is_full(&self) -> bool {
        self.read_idx >= READ_BUFFER_SIZE
    }

    /// The unused tail of the buffer, to be filled by a `recv`/`read` call.
    pub fn spare_capacity(&mut self) -> &mut [u8] {
        &mut self.data[self.read_idx..]
    }

    /// Records that `n` bytes were placed at the front of [`Self::spare_capacity`].
    pub fn mark_filled(&mut self, n: usize) {
        debug_assert!(self.read_idx + n <= READ_BUFFER_SIZE);
        self.read_idx += n;
    }

    /// Everything read so far, including bytes already consumed by the scanner.
    pub fn filled(&self) -> &[u8] {
        &self.data[..self.read_idx]
    }

    pub fn filled_mut(&mut self) -> &mut [u8] {
        &mut self.data[..self.read_idx]
    }
}

impl Default for ReadBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// The write side of a connection slot: header bytes (and, for error
/// responses, the whole body) accumulate here via [`fmt::Write`].
pub struct WriteBuffer {
    data: [u8; WRITE_BUFFER_SIZE],
    write_idx: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overflow;

impl WriteBuffer {
    pub fn new() -> Self {
        WriteBuffer {
            data: [0u8; WRITE_BUFFER_SIZE],
            write_idx: 0,
        }
    }

    pub fn reset(&mut self) {
        self.write_idx = 0;
    }

    pub fn len(&self) -> usize {
        self.write_idx
    }

    pub fn is_empty(&self) -> bool {
        self.write_idx == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.write_idx]
    }

    /// Appends raw bytes, failing rather than truncating if they would not fit.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), Overflow> {
        let end = self.write_idx + bytes.len();
        if end > WRITE_BUFFER_SIZE {
            return Err(Overflow);
        }
        self.data[self.write_idx..end].copy_from_slice(bytes);
        self.write_idx = end;
        Ok(())
    }
}

impl Default for WriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Bridges `write!`/`writeln!` onto [`WriteBuffer::push_bytes`], so the
/// response builder can format status lines and headers directly into the
/// fixed buffer instead of building a `String` first.
impl fmt::Write for WriteBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_bytes(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;

    #[test]
    fn read_buffer_tracks_fill_progress() {
        let mut buf = ReadBuffer::new();
        assert_eq!(buf.spare_capacity().len(), READ_BUFFER_SIZE);
        buf.spare_capacity()[..5].copy_from_slice(b"hello");
        buf.mark_filled(5);
        assert_eq!(buf.filled(), b"hello");
        assert_eq!(buf.spare_capacity().len(), READ_BUFFER_SIZE - 5);
    }

    #[test]
    fn read_buffer_reports_full() {
        let mut buf = ReadBuffer::new();
        buf.mark_filled(READ_BUFFER_SIZE);
        assert!(buf.is_full());
    }

    #[test]
    fn write_buffer_rejects_overflow_without_partial_write() {
        let mut buf = WriteBuffer::new();
        let huge = vec![b'x'; WRITE_BUFFER_SIZE + 1];
        let err = buf.push_bytes(&huge).unwrap_err();
        assert_eq!(err, Overflow);
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn write_buffer_supports_fmt_write() {
        let mut buf = WriteBuffer::new();
        write!(buf, "HTTP/1.1 {} {}\r\n", 200, "OK").unwrap();
        assert_eq!(buf.as_slice(), b"HTTP/1.1 200 OK\r\n");
    }

    #[test]
    fn write_buffer_reset_reuses_storage() {
        let mut buf = WriteBuffer::new();
        buf.push_bytes(b"abc").unwrap();
        buf.reset();
        assert_eq!(buf.len(), 0);
        buf.push_bytes(b"de").unwrap();
        assert_eq!(buf.as_slice(), b"de");
    }
}
