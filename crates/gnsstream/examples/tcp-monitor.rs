//! Local feed plus client: shows reconnect after the server hangs up.
//!
//! Run with:
//!   cargo run --example tcp-monitor
//!
//! The example binds a loopback feed that sends a few position records per
//! connection and then closes it. The client keeps receiving across the gaps.

use std::io::Write;
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use gnsstream::{ClientConfig, RetryPolicy, StreamingClientService};

const RECORDS_PER_CONNECTION: usize = 3;
const TOTAL_RECORDS: usize = 9;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();

    thread::spawn(move || {
        let mut seq = 0usize;
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            for _ in 0..RECORDS_PER_CONNECTION {
                seq += 1;
                let lat = 53.36 + seq as f64 * 1e-5;
                let lon = -6.50 - seq as f64 * 1e-5;
                // Split each record across two writes.
                let record = format!("{seq},{lat:.6},{lon:.6}\n");
                let (head, tail) = record.split_at(record.len() / 2);
                if stream.write_all(head.as_bytes()).is_err() {
                    break;
                }
                thread::sleep(Duration::from_millis(50));
                if stream.write_all(tail.as_bytes()).is_err() {
                    break;
                }
            }
        }
    });

    let config = ClientConfig::tcp("127.0.0.1", port)
        .with_retry(RetryPolicy::fixed(Duration::from_millis(250)));
    let mut service = StreamingClientService::new(config)?;
    service.start();

    let mut received = 0;
    while received < TOTAL_RECORDS {
        match service.receive(true, Some(Duration::from_secs(5))) {
            Some(record) => {
                received += 1;
                println!("{record}");
            }
            None => {
                eprintln!("no data for 5s, giving up");
                break;
            }
        }
    }

    service.stop();
    eprintln!("{:?}", service.stats());
    Ok(())
}
