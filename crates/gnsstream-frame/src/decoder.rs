use serde::{Deserialize, Serialize};

use crate::buffer::DEFAULT_MAX_BUFFER;
use crate::error::Result;
use crate::lines::LineDecoder;
use crate::message::Message;
use crate::nmea::{SentenceDecoder, SentenceFilter, DEFAULT_MAX_SENTENCE_LEN};

/// How a byte stream is cut into messages. Selected by configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Framing {
    /// `\n`-terminated UTF-8 records.
    #[default]
    Lines,
    /// NMEA sentences, filtered by identity.
    Sentences {
        #[serde(default)]
        filter: SentenceFilter,
        #[serde(default = "default_max_sentence_len")]
        max_sentence_len: usize,
    },
}

fn default_max_sentence_len() -> usize {
    DEFAULT_MAX_SENTENCE_LEN
}

impl Framing {
    /// Sentence framing with the given filter and default limits.
    pub fn sentences(filter: SentenceFilter) -> Self {
        Framing::Sentences {
            filter,
            max_sentence_len: DEFAULT_MAX_SENTENCE_LEN,
        }
    }

    /// Build a fresh decoder with an empty buffer capped at `max_buffer` bytes.
    pub fn decoder(&self, max_buffer: usize) -> FrameDecoder {
        match self {
            Framing::Lines => FrameDecoder::LineDelimited(LineDecoder::new(max_buffer)),
            Framing::Sentences {
                filter,
                max_sentence_len,
            } => FrameDecoder::SentenceFiltered(
                SentenceDecoder::new(filter.clone(), max_buffer)
                    .with_max_sentence_len(*max_sentence_len),
            ),
        }
    }
}

/// Stateful framer for one connection.
#[derive(Debug)]
pub enum FrameDecoder {
    LineDelimited(LineDecoder),
    SentenceFiltered(SentenceDecoder),
}

impl FrameDecoder {
    /// Feed a chunk; returns completed messages in stream order.
    ///
    /// An error means the buffer limit was hit and the connection should be
    /// dropped. Per-message faults are logged and skipped internally.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<Vec<Message>> {
        match self {
            FrameDecoder::LineDelimited(decoder) => decoder.decode(chunk),
            FrameDecoder::SentenceFiltered(decoder) => decoder.decode(chunk),
        }
    }

    /// Bytes held for an incomplete message.
    pub fn buffered(&self) -> usize {
        match self {
            FrameDecoder::LineDelimited(decoder) => decoder.buffered(),
            FrameDecoder::SentenceFiltered(decoder) => decoder.buffered(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FrameDecoder::LineDelimited(_) => "lines",
            FrameDecoder::SentenceFiltered(_) => "nmea-sentences",
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Framing::Lines.decoder(DEFAULT_MAX_BUFFER)
    }
}
