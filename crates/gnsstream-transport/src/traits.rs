use std::io::ErrorKind;
use std::time::Duration;

use crate::error::Result;

/// Result of a single bounded read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes were written to the front of the caller's buffer (`n >= 1`).
    Data(usize),
    /// No bytes arrived within the timeout. Not an error.
    Timeout,
    /// The peer or device closed the stream.
    Closed,
}

/// A connection to a telemetry source.
///
/// Implementations own the OS resource between `open()` and `close()`. The
/// lifecycle may repeat any number of times on the same value: each successful
/// `open()` must be matched by a `close()` before the next `open()`.
pub trait Transport: Send {
    /// Establish the connection. Bounded: never blocks indefinitely.
    fn open(&mut self) -> Result<()>;

    /// Read whatever is available into `buf`, waiting at most `timeout`.
    fn read_chunk(&mut self, buf: &mut [u8], timeout: Duration) -> Result<ReadOutcome>;

    /// Release the OS resource.
    ///
    /// Idempotent and infallible: safe on a never-opened or already-closed
    /// transport. Shutdown-phase errors are swallowed since the peer may
    /// already be gone.
    fn close(&mut self);

    /// Whether an open connection is currently held.
    fn is_open(&self) -> bool;

    /// Human-readable endpoint for diagnostics (e.g. `tcp://host:5000`).
    fn describe(&self) -> String;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn read_chunk(&mut self, buf: &mut [u8], timeout: Duration) -> Result<ReadOutcome> {
        (**self).read_chunk(buf, timeout)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Map a raw `read()` result onto a [`ReadOutcome`].
///
/// `Ok(0)` is end-of-stream; timeout-class errors become `Timeout`. Callers
/// retry `Interrupted` themselves before reaching here.
pub(crate) fn classify_read(result: std::io::Result<usize>) -> Result<ReadOutcome> {
    match result {
        Ok(0) => Ok(ReadOutcome::Closed),
        Ok(n) => Ok(ReadOutcome::Data(n)),
        Err(err) if is_timeout(&err) => Ok(ReadOutcome::Timeout),
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

/// Socket and serial APIs reject a zero timeout; clamp to the smallest usable value.
pub(crate) fn effective_timeout(timeout: Duration) -> Duration {
    if timeout.is_zero() {
        Duration::from_millis(1)
    } else {
        timeout
    }
}
