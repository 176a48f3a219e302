//! Supervised streaming client for telemetry sources.
//!
//! This is the "just works" layer. A [`StreamingClientService`] owns one
//! background [`IngestionWorker`] that connects, reads, frames and enqueues
//! messages, reconnecting according to a [`RetryPolicy`]. Consumers pull from
//! a [`BoundedChannel`] that drops the oldest message when full.

pub mod cancel;
pub mod channel;
pub mod config;
pub mod error;
pub mod retry;
pub mod service;
pub mod state;
pub mod worker;

pub use cancel::CancellationToken;
pub use channel::{BoundedChannel, DEFAULT_QUEUE_CAPACITY};
pub use config::{ClientConfig, TransportConfig, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SENTENCE};
pub use error::{ClientError, Result};
pub use retry::RetryPolicy;
pub use service::{StreamingClientService, TransportFactory};
pub use state::{ConnectionState, StateCell, StatsSnapshot, WorkerStats};
pub use worker::{IngestionWorker, WorkerHandle};
