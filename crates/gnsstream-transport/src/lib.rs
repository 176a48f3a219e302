//! Byte-stream transports for telemetry ingestion.
//!
//! Provides a unified interface over the links a positioning source can be
//! reached through:
//! - TCP sockets carrying newline-delimited records
//! - Serial/UART devices carrying receiver sentences
//!
//! This is the lowest layer of gnsstream. Every read is bounded by a timeout so
//! the caller regains control regularly, which is how the ingestion worker
//! observes cancellation without interrupting a blocked system call.

pub mod error;
pub mod serial;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use serial::SerialTransport;
pub use tcp::TcpTransport;
pub use traits::{ReadOutcome, Transport};
