//! Resumable framing for raw telemetry byte streams.
//!
//! Two framers share one contract:
//! - [`LineDecoder`]: `\n`-terminated UTF-8 records
//! - [`SentenceDecoder`]: checksum-verified NMEA sentences, filtered by identity
//!
//! Both accept arbitrarily split chunks, never emit a message twice, and refuse
//! to buffer past a configured limit. [`FrameDecoder`] selects between them at
//! runtime from a [`Framing`] value.

pub mod buffer;
pub mod decoder;
pub mod error;
pub mod lines;
pub mod message;
pub mod nmea;

pub use buffer::{RawBuffer, DEFAULT_MAX_BUFFER};
pub use decoder::{FrameDecoder, Framing};
pub use error::{FrameError, Result};
pub use lines::LineDecoder;
pub use message::{Message, Sentence};
pub use nmea::{
    checksum, parse_sentence, SentenceDecoder, SentenceFilter, DEFAULT_MAX_SENTENCE_LEN,
};
