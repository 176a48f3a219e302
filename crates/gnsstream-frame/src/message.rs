use bytes::Bytes;

/// One complete record recovered from the byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A newline-delimited text record, trimmed.
    Line(String),
    /// A checksum-verified receiver sentence.
    Sentence(Sentence),
}

impl Message {
    /// Record content as text.
    pub fn as_str(&self) -> &str {
        match self {
            Message::Line(line) => line,
            Message::Sentence(sentence) => sentence.as_str(),
        }
    }

    /// Record content as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Message::Line(line) => line.as_bytes(),
            Message::Sentence(sentence) => sentence.raw(),
        }
    }

    /// Sentence identity tag, for sentence-framed records.
    pub fn identity(&self) -> Option<&str> {
        match self {
            Message::Line(_) => None,
            Message::Sentence(sentence) => Some(sentence.identity()),
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated NMEA sentence.
///
/// `raw` holds the sentence from its start character through the checksum,
/// without the line terminator. It is guaranteed to be ASCII.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    identity: String,
    raw: Bytes,
}

impl Sentence {
    pub(crate) fn new(identity: String, raw: Bytes) -> Self {
        Self { identity, raw }
    }

    /// Address field, e.g. `GNGGA` or `PUBX`.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Two-letter talker id for standard (five-character) addresses.
    pub fn talker(&self) -> Option<&str> {
        self.is_standard().then(|| &self.identity[..2])
    }

    /// Three-letter sentence formatter for standard addresses, e.g. `GGA`.
    pub fn formatter(&self) -> Option<&str> {
        self.is_standard().then(|| &self.identity[2..])
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn as_str(&self) -> &str {
        // Parsing rejects non-ASCII input, so this never falls back.
        std::str::from_utf8(&self.raw).unwrap_or_default()
    }

    fn is_standard(&self) -> bool {
        self.identity.len() == 5 && !self.identity.starts_with('P')
    }
}
