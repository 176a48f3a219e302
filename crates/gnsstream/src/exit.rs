use std::fmt;

use gnsstream_client::ClientError;
use gnsstream_frame::FrameError;

pub const SUCCESS: i32 = 0;
pub const TRANSPORT_ERROR: i32 = 3;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// A `--sentence` value that does not parse is a usage error.
pub fn filter_error(context: &str, err: FrameError) -> CliError {
    CliError::usage(format!("{context}: {err}"))
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    match err {
        ClientError::InvalidConfig(_) => CliError::usage(format!("{context}: {err}")),
        ClientError::Spawn(_) => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}
