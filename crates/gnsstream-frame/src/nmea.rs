//! NMEA 0183 sentence framing.
//!
//! A sentence on the wire:
//! ```text
//! $GNGGA,092750.000,5321.6802,N,00630.3372,W,1,8,1.03,61.7,M,55.2,M,,*68\r\n
//! ^└─┬─┘└────────────────────── fields ──────────────────────────┘ └┬┘
//! │ address                                                      checksum (XOR of
//! start ('$' or '!')                                             bytes between start and '*')
//! ```
//! Receivers commonly interleave binary protocols (UBX, RTCM3) on the same
//! link. Bytes outside a sentence are skipped, so the decoder resynchronizes on
//! the next start character.

use std::fmt;
use std::str::FromStr;

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::buffer::RawBuffer;
use crate::error::{FrameError, Result};
use crate::message::{Message, Sentence};

/// Twice the 82-byte limit of the standard, to tolerate vendor extensions.
pub const DEFAULT_MAX_SENTENCE_LEN: usize = 164;

const MAX_ADDRESS_LEN: usize = 8;

fn is_start(byte: u8) -> bool {
    byte == b'$' || byte == b'!'
}

/// Which sentences a [`SentenceDecoder`] surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SentenceFilter {
    /// Every valid sentence.
    Any,
    /// Exact address match, e.g. `GNGGA`.
    Identity(String),
    /// Any talker with this formatter, e.g. `GGA` matches `GPGGA` and `GNGGA`.
    Formatter(String),
}

impl SentenceFilter {
    /// Whether `sentence` passes this filter.
    pub fn accepts(&self, sentence: &Sentence) -> bool {
        match self {
            SentenceFilter::Any => true,
            SentenceFilter::Identity(identity) => sentence.identity() == identity,
            SentenceFilter::Formatter(formatter) => {
                sentence.formatter() == Some(formatter.as_str())
            }
        }
    }
}

impl Default for SentenceFilter {
    /// The multi-constellation position fix sentence.
    fn default() -> Self {
        SentenceFilter::Identity("GNGGA".to_string())
    }
}

impl FromStr for SentenceFilter {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "*" {
            return Ok(SentenceFilter::Any);
        }
        if s.is_empty()
            || s.len() > MAX_ADDRESS_LEN
            || !s.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(FrameError::InvalidFilter(s.to_string()));
        }
        let s = s.to_ascii_uppercase();
        if s.len() == 3 {
            Ok(SentenceFilter::Formatter(s))
        } else {
            Ok(SentenceFilter::Identity(s))
        }
    }
}

impl TryFrom<String> for SentenceFilter {
    type Error = FrameError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SentenceFilter> for String {
    fn from(filter: SentenceFilter) -> Self {
        filter.to_string()
    }
}

impl fmt::Display for SentenceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentenceFilter::Any => f.write_str("*"),
            SentenceFilter::Identity(s) | SentenceFilter::Formatter(s) => f.write_str(s),
        }
    }
}

/// XOR of all bytes, as used by the NMEA checksum.
pub fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0u8, |acc, b| acc ^ b)
}

/// Validate one sentence (with or without its line terminator).
pub fn parse_sentence(line: &[u8]) -> Result<Sentence> {
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    let line = &line[..end];

    if line.is_empty() || !is_start(line[0]) {
        return Err(FrameError::InvalidSentence("missing start character"));
    }
    if !line.is_ascii() {
        return Err(FrameError::InvalidSentence("non-ASCII bytes"));
    }

    let star = line
        .iter()
        .rposition(|b| *b == b'*')
        .ok_or(FrameError::InvalidSentence("missing checksum"))?;
    if line.len() - star != 3 {
        return Err(FrameError::InvalidSentence("malformed checksum field"));
    }
    let expected = parse_hex_byte(line[star + 1], line[star + 2])
        .ok_or(FrameError::InvalidSentence("checksum is not hexadecimal"))?;

    let body = &line[1..star];
    let actual = checksum(body);
    if actual != expected {
        return Err(FrameError::ChecksumMismatch { expected, actual });
    }

    let address_len = body
        .iter()
        .position(|b| *b == b',')
        .unwrap_or(body.len());
    let address = &body[..address_len];
    if address.is_empty()
        || address.len() > MAX_ADDRESS_LEN
        || !address.iter().all(|b| b.is_ascii_alphanumeric())
    {
        return Err(FrameError::InvalidSentence("invalid address field"));
    }

    // Validated ASCII above.
    let identity = String::from_utf8_lossy(address).into_owned();
    Ok(Sentence::new(identity, Bytes::copy_from_slice(line)))
}

fn parse_hex_byte(hi: u8, lo: u8) -> Option<u8> {
    let digit = |c: u8| (c as char).to_digit(16).map(|d| d as u8);
    Some((digit(hi)? << 4) | digit(lo)?)
}

/// Extracts checksum-verified sentences matching a [`SentenceFilter`].
#[derive(Debug)]
pub struct SentenceDecoder {
    buf: RawBuffer,
    filter: SentenceFilter,
    max_sentence_len: usize,
    /// Bytes after the leading start character already scanned for a boundary.
    scanned: usize,
}

impl SentenceDecoder {
    pub fn new(filter: SentenceFilter, max_buffer: usize) -> Self {
        Self {
            buf: RawBuffer::new(max_buffer),
            filter,
            max_sentence_len: DEFAULT_MAX_SENTENCE_LEN,
            scanned: 0,
        }
    }

    /// Override the longest pending sentence tolerated without a terminator.
    pub fn with_max_sentence_len(mut self, len: usize) -> Self {
        self.max_sentence_len = len.max(1);
        self
    }

    pub fn filter(&self) -> &SentenceFilter {
        &self.filter
    }

    /// Feed one received chunk and return every accepted sentence it completed.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<Vec<Message>> {
        self.buf.append(chunk)?;

        let mut messages = Vec::new();
        while let Some(unit) = self.next_unit() {
            match parse_sentence(&unit) {
                Ok(sentence) if self.filter.accepts(&sentence) => {
                    messages.push(Message::Sentence(sentence));
                }
                Ok(sentence) => {
                    trace!(identity = sentence.identity(), "sentence filtered out");
                }
                Err(err) => {
                    warn!(error = %err, preview = %preview(&unit), "dropping malformed sentence");
                }
            }
        }
        Ok(messages)
    }

    /// Bytes held for an incomplete sentence.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Pop the next terminated candidate sentence, resynchronizing past noise.
    fn next_unit(&mut self) -> Option<BytesMut> {
        loop {
            let data = self.buf.as_slice();
            match data.iter().position(|b| is_start(*b)) {
                None => {
                    if !data.is_empty() {
                        trace!(bytes = data.len(), "skipping non-sentence bytes");
                    }
                    self.buf.clear();
                    self.scanned = 0;
                    return None;
                }
                Some(0) => {}
                Some(skip) => {
                    trace!(bytes = skip, "skipping non-sentence bytes");
                    self.buf.discard(skip);
                    self.scanned = 0;
                }
            }

            let data = self.buf.as_slice();
            let from = self.scanned.max(1);
            let boundary = data
                .get(from..)
                .and_then(|rest| rest.iter().position(|b| *b == b'\n' || is_start(*b)))
                .map(|i| from + i);

            match boundary {
                Some(end) if data[end] == b'\n' => {
                    self.scanned = 0;
                    return Some(self.buf.split_to(end + 1));
                }
                Some(next_start) => {
                    warn!(
                        preview = %preview(&data[..next_start]),
                        "dropping truncated sentence"
                    );
                    self.buf.discard(next_start);
                    self.scanned = 0;
                }
                None if data.len() > self.max_sentence_len => {
                    warn!(
                        bytes = data.len(),
                        max = self.max_sentence_len,
                        "dropping unterminated oversized sentence"
                    );
                    self.buf.discard(1);
                    self.scanned = 0;
                }
                None => {
                    self.scanned = data.len();
                    return None;
                }
            }
        }
    }
}

fn preview(bytes: &[u8]) -> String {
    let shown = &bytes[..bytes.len().min(50)];
    String::from_utf8_lossy(shown).trim_end().to_string()
}
