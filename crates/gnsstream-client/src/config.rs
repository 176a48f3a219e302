use std::path::PathBuf;
use std::time::Duration;

use gnsstream_frame::{Framing, SentenceFilter, DEFAULT_MAX_BUFFER};
use gnsstream_transport::{SerialTransport, TcpTransport, Transport};
use serde::{Deserialize, Serialize};

use crate::channel::DEFAULT_QUEUE_CAPACITY;
use crate::error::{ClientError, Result};
use crate::retry::RetryPolicy;

/// Host used when no endpoint is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// Port used when no endpoint is configured.
pub const DEFAULT_PORT: u16 = 5000;

/// Fix sentence surfaced by default on serial links.
pub const DEFAULT_SENTENCE: &str = "GNGGA";

/// `Duration` as floating-point seconds.
pub(crate) mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Where the byte stream comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportConfig {
    Tcp {
        host: String,
        port: u16,
        #[serde(with = "secs", default = "default_connect_timeout")]
        connect_timeout: Duration,
    },
    Serial {
        path: PathBuf,
        #[serde(default = "default_baud_rate")]
        baud_rate: u32,
    },
}

fn default_connect_timeout() -> Duration {
    TcpTransport::DEFAULT_CONNECT_TIMEOUT
}

fn default_baud_rate() -> u32 {
    SerialTransport::DEFAULT_BAUD_RATE
}

impl TransportConfig {
    /// Build an unopened transport for this endpoint.
    pub fn build(&self) -> Box<dyn Transport> {
        match self {
            TransportConfig::Tcp {
                host,
                port,
                connect_timeout,
            } => Box::new(TcpTransport::new(host.clone(), *port).with_connect_timeout(*connect_timeout)),
            TransportConfig::Serial { path, baud_rate } => {
                Box::new(SerialTransport::new(path, *baud_rate))
            }
        }
    }

    /// Endpoint in a form suitable for logs.
    pub fn endpoint(&self) -> String {
        match self {
            TransportConfig::Tcp { host, port, .. } => format!("tcp://{host}:{port}"),
            TransportConfig::Serial { path, baud_rate } => {
                format!("serial://{}@{baud_rate}", path.display())
            }
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig::Tcp {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: default_connect_timeout(),
        }
    }
}

/// Settings for a [`StreamingClientService`](crate::StreamingClientService).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub transport: TransportConfig,
    pub framing: Framing,
    /// Upper bound on a single blocking read; also the cancellation latency.
    #[serde(with = "secs")]
    pub read_timeout: Duration,
    /// Largest partial message held before the connection is dropped.
    pub max_buffer_bytes: usize,
    /// Bytes requested per read; at most `max_buffer_bytes`.
    pub chunk_size: usize,
    /// Messages held before the oldest is evicted.
    pub queue_capacity: usize,
    pub retry: RetryPolicy,
    /// How long `stop()` waits for the worker thread.
    #[serde(with = "secs")]
    pub join_timeout: Duration,
}

impl ClientConfig {
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);
    pub const DEFAULT_CHUNK_SIZE: usize = 4096;
    pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

    /// Newline-delimited records from a TCP server.
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self {
            transport: TransportConfig::Tcp {
                host: host.into(),
                port,
                connect_timeout: default_connect_timeout(),
            },
            framing: Framing::Lines,
            ..Self::base()
        }
    }

    /// NMEA sentences from a serial receiver, surfacing only `GNGGA`.
    pub fn serial(path: impl Into<PathBuf>, baud_rate: u32) -> Self {
        Self {
            transport: TransportConfig::Serial {
                path: path.into(),
                baud_rate,
            },
            framing: Framing::sentences(SentenceFilter::Identity(DEFAULT_SENTENCE.to_string())),
            ..Self::base()
        }
    }

    fn base() -> Self {
        Self {
            transport: TransportConfig::default(),
            framing: Framing::default(),
            read_timeout: Self::DEFAULT_READ_TIMEOUT,
            max_buffer_bytes: DEFAULT_MAX_BUFFER,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            retry: RetryPolicy::default(),
            join_timeout: Self::DEFAULT_JOIN_TIMEOUT,
        }
    }

    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_max_buffer_bytes(mut self, max: usize) -> Self {
        self.max_buffer_bytes = max;
        self
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    /// Override the TCP connect timeout. No effect on serial endpoints.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        if let TransportConfig::Tcp {
            connect_timeout, ..
        } = &mut self.transport
        {
            *connect_timeout = timeout;
        }
        self
    }

    /// Reject settings the worker cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Err(ClientError::InvalidConfig(reason.to_string()));

        if self.read_timeout.is_zero() {
            return invalid("read_timeout must be greater than zero");
        }
        if self.max_buffer_bytes == 0 {
            return invalid("max_buffer_bytes must be greater than zero");
        }
        if self.chunk_size == 0 {
            return invalid("chunk_size must be greater than zero");
        }
        if self.chunk_size > self.max_buffer_bytes {
            return invalid("chunk_size must not exceed max_buffer_bytes");
        }
        if self.queue_capacity == 0 {
            return invalid("queue_capacity must be greater than zero");
        }
        if let Framing::Sentences {
            max_sentence_len, ..
        } = &self.framing
        {
            if *max_sentence_len == 0 {
                return invalid("max_sentence_len must be greater than zero");
            }
        }
        match &self.transport {
            TransportConfig::Tcp { host, port, .. } => {
                if host.trim().is_empty() {
                    return invalid("tcp host must not be empty");
                }
                if *port == 0 {
                    return invalid("tcp port must not be zero");
                }
            }
            TransportConfig::Serial { path, baud_rate } => {
                if path.as_os_str().is_empty() {
                    return invalid("serial path must not be empty");
                }
                if *baud_rate == 0 {
                    return invalid("baud_rate must be greater than zero");
                }
            }
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::base()
    }
}
