use gnsstream_client::ClientConfig;
use gnsstream_frame::{Framing, SentenceFilter};

use crate::cmd::{stream, SerialArgs};
use crate::exit::{filter_error, CliResult};
use crate::output::OutputFormat;

pub fn run(args: SerialArgs, format: OutputFormat) -> CliResult<i32> {
    let config = build_config(&args)?;
    stream::run(config, &args.stream, format)
}

fn build_config(args: &SerialArgs) -> CliResult<ClientConfig> {
    let filter: SentenceFilter = args
        .sentence
        .parse()
        .map_err(|err| filter_error("invalid --sentence", err))?;
    let config = ClientConfig::serial(&args.path, args.baud).with_framing(Framing::sentences(filter));
    args.stream.apply(config)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;
    use gnsstream_client::{RetryPolicy, TransportConfig};

    use super::*;
    use crate::cmd::Command;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    fn parse(args: &[&str]) -> SerialArgs {
        match TestCli::try_parse_from(args).unwrap().command {
            Command::Serial(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn defaults_to_gngga_at_115200() {
        let config = build_config(&parse(&["t", "serial", "/dev/ttyUSB0"])).unwrap();
        assert_eq!(
            config.transport,
            TransportConfig::Serial {
                path: PathBuf::from("/dev/ttyUSB0"),
                baud_rate: 115_200,
            }
        );
        assert_eq!(config.framing, Framing::sentences(SentenceFilter::default()));
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn any_sentence_and_baud() {
        let config = build_config(&parse(&[
            "t", "serial", "COM3", "--baud", "9600", "--sentence", "*", "--retry", "none",
        ]))
        .unwrap();
        assert!(matches!(
            config.transport,
            TransportConfig::Serial { baud_rate: 9600, .. }
        ));
        assert_eq!(config.framing, Framing::sentences(SentenceFilter::Any));
        assert_eq!(config.retry, RetryPolicy::None);
    }
}
