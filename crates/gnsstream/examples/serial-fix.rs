//! Print position fixes from a serial GNSS receiver.
//!
//! Run with:
//!   cargo run --example serial-fix -- /dev/ttyUSB0 115200
//!
//! Any talker's GGA sentence is accepted; other traffic on the link (other
//! sentences, binary protocol frames) is skipped.

use std::time::Duration;

use gnsstream::frame::{Framing, Message, SentenceFilter};
use gnsstream::{ClientConfig, RetryPolicy, StreamingClientService};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let baud = match args.next() {
        Some(baud) => baud.parse()?,
        None => 115_200,
    };

    let config = ClientConfig::serial(path, baud)
        .with_framing(Framing::sentences(SentenceFilter::Formatter("GGA".into())))
        .with_retry(RetryPolicy::backoff(
            Duration::from_secs(1),
            Duration::from_secs(30),
        ));
    let mut service = StreamingClientService::new(config)?;
    service.start();

    loop {
        let Some(message) = service.receive(true, Some(Duration::from_secs(10))) else {
            eprintln!("no fix for 10s (state: {})", service.state());
            continue;
        };
        if let Message::Sentence(sentence) = &message {
            let fields: Vec<&str> = sentence.as_str().split(',').collect();
            // GGA: time, lat, N/S, lon, E/W, quality, satellites
            if fields.len() > 7 {
                println!(
                    "{} {} {}{} {}{} q={} sats={}",
                    sentence.identity(),
                    fields[1],
                    fields[2],
                    fields[3],
                    fields[4],
                    fields[5],
                    fields[6],
                    fields[7]
                );
            }
        }
    }
}
