/// Errors surfaced by the client layer.
///
/// Expected operating conditions (timeouts, disconnects, malformed input) are
/// handled inside the worker and never reach the caller as errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Configuration rejected by `ClientConfig::validate`.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The OS refused to start the worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
