use bytes::{Buf, BytesMut};

use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Default upper bound on buffered, not-yet-framed bytes: 10 MiB.
pub const DEFAULT_MAX_BUFFER: usize = 10 * 1024 * 1024;

/// Growable byte arena with a hard high-water mark.
///
/// The limit is checked before every append; a chunk that would cross it is
/// rejected whole, so the buffer never holds a silently truncated frame.
#[derive(Debug)]
pub struct RawBuffer {
    buf: BytesMut,
    max: usize,
}

impl RawBuffer {
    /// Create an empty buffer that holds at most `max` bytes.
    pub fn new(max: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY.min(max)),
            max,
        }
    }

    /// Append a received chunk.
    pub fn append(&mut self, chunk: &[u8]) -> Result<()> {
        let size = self.buf.len().saturating_add(chunk.len());
        if size > self.max {
            return Err(FrameError::BufferOverflow {
                size,
                max: self.max,
            });
        }
        self.buf.extend_from_slice(chunk);
        Ok(())
    }

    /// Index of the first `byte` at or after `from`.
    pub fn position_from(&self, from: usize, byte: u8) -> Option<usize> {
        self.buf
            .get(from..)?
            .iter()
            .position(|b| *b == byte)
            .map(|i| from + i)
    }

    /// Remove and return the first `len` bytes.
    pub fn split_to(&mut self, len: usize) -> BytesMut {
        self.buf.split_to(len.min(self.buf.len()))
    }

    /// Drop the first `len` bytes.
    pub fn discard(&mut self, len: usize) {
        self.buf.advance(len.min(self.buf.len()));
    }

    /// Unconsumed bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Configured high-water mark.
    pub fn max_len(&self) -> usize {
        self.max
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_within_limit() {
        let mut buf = RawBuffer::new(8);
        buf.append(b"abcd").unwrap();
        buf.append(b"efgh").unwrap();
        assert_eq!(buf.as_slice(), b"abcdefgh");
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn append_past_limit_is_rejected_whole() {
        let mut buf = RawBuffer::new(8);
        buf.append(b"abcdef").unwrap();
        let err = buf.append(b"ghi").unwrap_err();
        assert!(matches!(err, FrameError::BufferOverflow { size: 9, max: 8 }));
        assert_eq!(buf.as_slice(), b"abcdef");
    }

    #[test]
    fn split_and_discard_consume_prefix() {
        let mut buf = RawBuffer::new(64);
        buf.append(b"one\ntwo\nrest").unwrap();

        let end = buf.position_from(0, b'\n').unwrap();
        assert_eq!(buf.split_to(end + 1).as_ref(), b"one\n");

        buf.discard(4);
        assert_eq!(buf.as_slice(), b"rest");
        assert_eq!(buf.position_from(0, b'\n'), None);
    }

    #[test]
    fn position_from_respects_offset() {
        let mut buf = RawBuffer::new(64);
        buf.append(b"a\nb\n").unwrap();
        assert_eq!(buf.position_from(0, b'\n'), Some(1));
        assert_eq!(buf.position_from(2, b'\n'), Some(3));
        assert_eq!(buf.position_from(10, b'\n'), None);
    }

    #[test]
    fn clear_resets() {
        let mut buf = RawBuffer::new(16);
        buf.append(b"xyz").unwrap();
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.max_len(), 16);
    }
}
