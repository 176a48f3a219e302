//! Resilient GNSS telemetry streaming over TCP and serial links.
//!
//! gnsstream keeps a long-lived connection to a positioning source, frames the
//! raw byte stream into records, and hands them to consumers through a bounded
//! queue that always favors the freshest data.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte-stream transports (TCP, serial) with bounded reads
//! - [`frame`]: resumable framing into lines or checksum-verified NMEA sentences
//! - [`client`]: reconnecting ingestion worker and streaming service (behind `client` feature)
//!
//! ```no_run
//! use std::time::Duration;
//! use gnsstream::client::{ClientConfig, StreamingClientService};
//!
//! let mut service = StreamingClientService::new(ClientConfig::serial("/dev/ttyUSB0", 115_200))?;
//! service.start();
//! if let Some(fix) = service.receive(true, Some(Duration::from_secs(2))) {
//!     println!("{fix}");
//! }
//! service.stop();
//! # Ok::<(), gnsstream::client::ClientError>(())
//! ```

/// Re-export transport types.
pub mod transport {
    pub use gnsstream_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use gnsstream_frame::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use gnsstream_client::*;
}

#[cfg(feature = "client")]
pub use gnsstream_client::{ClientConfig, RetryPolicy, StreamingClientService};
pub use gnsstream_frame::{Framing, Message, SentenceFilter};
