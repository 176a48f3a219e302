use gnsstream_client::ClientConfig;
use gnsstream_frame::{Framing, SentenceFilter};

use crate::cmd::{parse_duration, stream, TcpArgs};
use crate::exit::{filter_error, CliResult};
use crate::output::OutputFormat;

pub fn run(args: TcpArgs, format: OutputFormat) -> CliResult<i32> {
    let config = build_config(&args)?;
    stream::run(config, &args.stream, format)
}

fn build_config(args: &TcpArgs) -> CliResult<ClientConfig> {
    let mut config = ClientConfig::tcp(args.host.clone(), args.port)
        .with_connect_timeout(parse_duration(&args.connect_timeout)?);
    if let Some(filter) = &args.sentence {
        let filter: SentenceFilter = filter
            .parse()
            .map_err(|err| filter_error("invalid --sentence", err))?;
        config = config.with_framing(Framing::sentences(filter));
    }
    args.stream.apply(config)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;
    use gnsstream_client::TransportConfig;

    use super::*;
    use crate::cmd::Command;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    fn parse(args: &[&str]) -> TcpArgs {
        match TestCli::try_parse_from(args).unwrap().command {
            Command::Tcp(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn defaults_to_line_framing() {
        let config = build_config(&parse(&["t", "tcp", "localhost", "5000"])).unwrap();
        assert_eq!(config.framing, Framing::Lines);
        assert_eq!(
            config.transport,
            TransportConfig::Tcp {
                host: "localhost".into(),
                port: 5000,
                connect_timeout: Duration::from_secs(5),
            }
        );
    }

    #[test]
    fn sentence_switches_to_nmea() {
        let config = build_config(&parse(&[
            "t", "tcp", "localhost", "5000", "--sentence", "gga", "--connect-timeout", "500ms",
        ]))
        .unwrap();
        assert_eq!(
            config.framing,
            Framing::sentences(SentenceFilter::Formatter("GGA".into()))
        );
        assert!(matches!(
            config.transport,
            TransportConfig::Tcp { connect_timeout, .. } if connect_timeout == Duration::from_millis(500)
        ));
    }

    #[test]
    fn bad_sentence_is_usage_error() {
        let err = build_config(&parse(&["t", "tcp", "localhost", "5000", "--sentence", "G-G"]))
            .unwrap_err();
        assert_eq!(err.code, crate::exit::USAGE);
    }
}
