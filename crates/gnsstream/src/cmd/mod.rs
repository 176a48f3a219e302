use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use gnsstream_client::{ClientConfig, RetryPolicy};

use crate::exit::{CliError, CliResult};
use crate::output::OutputFormat;

pub mod serial;
pub mod stream;
pub mod tcp;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream newline-delimited records from a TCP server.
    Tcp(TcpArgs),
    /// Stream NMEA sentences from a serial receiver.
    Serial(SerialArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Tcp(args) => tcp::run(args, format),
        Command::Serial(args) => serial::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct TcpArgs {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Treat the stream as NMEA and keep only sentences matching FILTER
    /// (e.g. GNGGA, GGA, or '*').
    #[arg(long, value_name = "FILTER")]
    pub sentence: Option<String>,
    /// Connect timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub connect_timeout: String,
    #[command(flatten)]
    pub stream: StreamArgs,
}

#[derive(Args, Debug)]
pub struct SerialArgs {
    /// Serial device path (e.g. /dev/ttyUSB0, COM3).
    pub path: PathBuf,
    /// Baud rate.
    #[arg(long, short = 'b', default_value_t = 115_200)]
    pub baud: u32,
    /// Sentences to keep: full address (GNGGA), formatter (GGA), or '*'.
    #[arg(long, default_value = "GNGGA")]
    pub sentence: String,
    #[command(flatten)]
    pub stream: StreamArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum RetryKind {
    /// Give up after the first failed connect.
    None,
    /// Wait --retry-delay between attempts.
    Fixed,
    /// Start at --retry-delay and double up to --retry-max.
    Backoff,
}

/// Options shared by every streaming subcommand.
#[derive(Args, Debug)]
pub struct StreamArgs {
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<u64>,
    /// Messages buffered before the oldest is dropped.
    #[arg(long, default_value_t = gnsstream_client::DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,
    /// Upper bound on a single read (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms")]
    pub read_timeout: String,
    /// Reconnect policy.
    #[arg(long, value_enum, default_value = "fixed")]
    pub retry: RetryKind,
    /// Delay between connect attempts (initial delay for backoff).
    #[arg(long, default_value = "5s")]
    pub retry_delay: String,
    /// Longest backoff delay.
    #[arg(long, default_value = "60s")]
    pub retry_max: String,
    /// Print connection counters when the stream ends.
    #[arg(long)]
    pub summary: bool,
}

impl StreamArgs {
    /// Apply the shared options on top of a transport-specific config.
    pub fn apply(&self, config: ClientConfig) -> CliResult<ClientConfig> {
        let retry = match self.retry {
            RetryKind::None => RetryPolicy::None,
            RetryKind::Fixed => RetryPolicy::fixed(parse_duration(&self.retry_delay)?),
            RetryKind::Backoff => RetryPolicy::backoff(
                parse_duration(&self.retry_delay)?,
                parse_duration(&self.retry_max)?,
            ),
        };
        Ok(config
            .with_queue_capacity(self.queue_capacity)
            .with_read_timeout(parse_duration(&self.read_timeout)?)
            .with_retry(retry))
    }
}

/// Parse `150ms`, `2s`, or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    fn stream_args(retry: RetryKind) -> StreamArgs {
        StreamArgs {
            count: None,
            queue_capacity: 10,
            read_timeout: "50ms".into(),
            retry,
            retry_delay: "1s".into(),
            retry_max: "8s".into(),
            summary: false,
        }
    }

    #[test]
    fn apply_maps_retry_kinds() {
        let base = ClientConfig::tcp("localhost", 5000);

        let config = stream_args(RetryKind::None).apply(base.clone()).unwrap();
        assert_eq!(config.retry, RetryPolicy::None);
        assert_eq!(config.queue_capacity, 10);
        assert_eq!(config.read_timeout, Duration::from_millis(50));

        let config = stream_args(RetryKind::Fixed).apply(base.clone()).unwrap();
        assert_eq!(config.retry, RetryPolicy::fixed(Duration::from_secs(1)));

        let config = stream_args(RetryKind::Backoff).apply(base).unwrap();
        assert_eq!(
            config.retry,
            RetryPolicy::backoff(Duration::from_secs(1), Duration::from_secs(8))
        );
    }
}
