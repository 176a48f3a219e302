use std::borrow::Cow;

use tracing::warn;

use crate::buffer::RawBuffer;
use crate::error::Result;
use crate::message::Message;

const DELIMITER: u8 = b'\n';
const PREVIEW_LEN: usize = 50;

/// Extracts `\n`-terminated UTF-8 records from a byte stream.
///
/// Invalid UTF-8 is replaced rather than rejected; surrounding whitespace
/// (including a `\r` before the delimiter) is trimmed and blank lines are
/// skipped. The undelimited tail is kept for the next chunk.
#[derive(Debug)]
pub struct LineDecoder {
    buf: RawBuffer,
    /// Bytes already known not to contain a delimiter.
    scanned: usize,
}

impl LineDecoder {
    pub fn new(max_buffer: usize) -> Self {
        Self {
            buf: RawBuffer::new(max_buffer),
            scanned: 0,
        }
    }

    /// Feed one received chunk and return every record it completed, in order.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<Vec<Message>> {
        self.buf.append(chunk)?;

        let mut messages = Vec::new();
        while let Some(end) = self.buf.position_from(self.scanned, DELIMITER) {
            let line = self.buf.split_to(end + 1);
            self.scanned = 0;
            if let Some(text) = decode_line(&line[..end]) {
                messages.push(Message::Line(text));
            }
        }
        self.scanned = self.buf.len();

        Ok(messages)
    }

    /// Bytes waiting for a delimiter.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

fn decode_line(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    if let Cow::Owned(_) = text {
        let preview = &bytes[..bytes.len().min(PREVIEW_LEN)];
        warn!(?preview, "invalid UTF-8 in record, replaced");
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
