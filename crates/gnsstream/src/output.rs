use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use gnsstream_client::StatsSnapshot;
use gnsstream_frame::Message;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    seq: u64,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    identity: Option<&'a str>,
    data: &'a str,
    source: &'a str,
    received_at: f64,
}

pub fn print_message(message: &Message, seq: u64, source: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                seq,
                kind: kind(message),
                identity: message.identity(),
                data: message.as_str(),
                source,
                received_at: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SEQ", "KIND", "IDENTITY", "DATA"])
                .add_row(vec![
                    seq.to_string(),
                    kind(message).to_string(),
                    message.identity().unwrap_or("-").to_string(),
                    message.as_str().to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => match message.identity() {
            Some(identity) => println!("#{seq} [{identity}] {}", fields(message.as_str())),
            None => println!("#{seq} {}", message.as_str()),
        },
        OutputFormat::Raw => {
            let mut out = std::io::stdout();
            let _ = out.write_all(message.as_bytes());
            let _ = out.write_all(b"\n");
            let _ = out.flush();
        }
    }
}

#[derive(Serialize)]
struct SummaryOutput<'a> {
    source: &'a str,
    printed: u64,
    connect_attempts: u64,
    connections: u64,
    bytes_received: u64,
    messages: u64,
    evicted: u64,
    overflows: u64,
}

/// End-of-run counters. Goes to stderr except in JSON mode, where it is the
/// final stdout record.
pub fn print_summary(stats: &StatsSnapshot, printed: u64, source: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SummaryOutput {
                source,
                printed,
                connect_attempts: stats.connect_attempts,
                connections: stats.connections,
                bytes_received: stats.bytes_received,
                messages: stats.messages,
                evicted: stats.evicted,
                overflows: stats.overflows,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SOURCE", "PRINTED", "CONNECTIONS", "BYTES", "MESSAGES", "EVICTED", "OVERFLOWS"])
                .add_row(vec![
                    source.to_string(),
                    printed.to_string(),
                    format!("{}/{}", stats.connections, stats.connect_attempts),
                    stats.bytes_received.to_string(),
                    stats.messages.to_string(),
                    stats.evicted.to_string(),
                    stats.overflows.to_string(),
                ]);
            eprintln!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            eprintln!(
                "{source}: printed={printed} messages={} evicted={} bytes={} connections={}/{} overflows={}",
                stats.messages,
                stats.evicted,
                stats.bytes_received,
                stats.connections,
                stats.connect_attempts,
                stats.overflows
            );
        }
    }
}

fn kind(message: &Message) -> &'static str {
    match message {
        Message::Line(_) => "line",
        Message::Sentence(_) => "sentence",
    }
}

/// Sentence fields without the address and checksum.
fn fields(sentence: &str) -> &str {
    let body = sentence.split_once(',').map_or("", |(_, rest)| rest);
    body.rsplit_once('*').map_or(body, |(fields, _)| fields)
}

fn now_unix_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
