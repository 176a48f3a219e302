/// Errors that can occur while framing a byte stream.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Appending a chunk would grow the buffer past its configured limit.
    ///
    /// Fatal for the current connection: the stream is treated as corrupt.
    #[error("frame buffer overflow ({size} bytes, max {max})")]
    BufferOverflow { size: usize, max: usize },

    /// A sentence failed structural validation.
    #[error("invalid sentence: {0}")]
    InvalidSentence(&'static str),

    /// A sentence checksum did not match its content.
    #[error("sentence checksum mismatch (expected {expected:#04x}, computed {actual:#04x})")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// A sentence filter string could not be parsed.
    #[error("invalid sentence filter {0:?}")]
    InvalidFilter(String),
}

pub type Result<T> = std::result::Result<T, FrameError>;
