mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "gnsstream", version, about = "Stream GNSS telemetry from TCP or serial sources")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        env = "GNSSTREAM_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tcp_subcommand() {
        let cli = Cli::try_parse_from([
            "gnsstream",
            "tcp",
            "localhost",
            "5000",
            "--count",
            "10",
            "--retry",
            "backoff",
        ])
        .expect("tcp args should parse");

        match cli.command {
            Command::Tcp(args) => {
                assert_eq!(args.port, 5000);
                assert_eq!(args.stream.count, Some(10));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_out_of_range_port() {
        let err = Cli::try_parse_from(["gnsstream", "tcp", "localhost", "70000"])
            .expect_err("port above u16 should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "gnsstream",
            "serial",
            "/dev/ttyUSB0",
            "--format",
            "raw",
            "--log-level",
            "debug",
        ])
        .expect("global flags should parse anywhere");
        assert!(matches!(cli.format, Some(OutputFormat::Raw)));
        assert!(matches!(cli.command, Command::Serial(_)));
    }

    #[test]
    fn rejects_unknown_retry_policy() {
        let err = Cli::try_parse_from(["gnsstream", "tcp", "h", "1", "--retry", "forever"])
            .expect_err("unknown retry should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
