use std::path::PathBuf;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The host name could not be resolved to any socket address.
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        source: std::io::Error,
    },

    /// Failed to connect to the specified endpoint.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        source: std::io::Error,
    },

    /// Failed to open the serial device.
    #[error("failed to open serial device {path}: {source}")]
    SerialOpen {
        path: PathBuf,
        source: serialport::Error,
    },

    /// An I/O error occurred on an open stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A read was attempted before `open()` succeeded or after `close()`.
    #[error("transport is not open")]
    NotOpen,
}

pub type Result<T> = std::result::Result<T, TransportError>;
