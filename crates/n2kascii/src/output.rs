use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use n2kascii_codec::pgn::{is_pdu1, pgn_name};
use n2kascii_codec::{encode, WireMessage, DEFAULT_ENCODE_CAPACITY};
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
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    pgn: u32,
    pgn_name: &'a str,
    pdu: &'static str,
    source: u8,
    destination: u8,
    priority: u8,
    timestamp: Option<&'a str>,
    payload_len: usize,
    payload: String,
}

impl<'a> MessageOutput<'a> {
    fn from_message(message: &'a WireMessage) -> Self {
        Self {
            pgn: message.pgn,
            pgn_name: pgn_name(message.pgn),
            pdu: pdu_format(message.pgn),
            source: message.source,
            destination: message.destination,
            priority: message.priority,
            timestamp: message.timestamp.as_deref(),
            payload_len: message.payload.len(),
            payload: payload_hex(&message.payload),
        }
    }
}

/// Print one message.
pub fn print_message(message: &WireMessage, format: OutputFormat) {
    print_messages(std::slice::from_ref(message), format);
}

/// Print a batch of messages. Table output puts the batch in one table.
pub fn print_messages(messages: &[WireMessage], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for message in messages {
                println!(
                    "{}",
                    serde_json::to_string(&MessageOutput::from_message(message))
                        .unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            if messages.is_empty() {
                return;
            }
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PGN", "NAME", "PDU", "SRC", "DST", "PRIO", "LEN", "DATA"]);
            for message in messages {
                table.add_row(vec![
                    message.pgn.to_string(),
                    pgn_name(message.pgn).to_string(),
                    pdu_format(message.pgn).to_string(),
                    format!("{:02X}", message.source),
                    format!("{:02X}", message.destination),
                    message.priority.to_string(),
                    message.payload.len().to_string(),
                    payload_hex(&message.payload),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for message in messages {
                println!("{}", pretty_line(message));
            }
        }
        OutputFormat::Raw => {
            for message in messages {
                match encode(message, DEFAULT_ENCODE_CAPACITY) {
                    Ok(line) => println!("{line}"),
                    Err(err) => eprintln!("error: cannot encode pgn {}: {err}", message.pgn),
                }
            }
        }
    }
}

fn pretty_line(message: &WireMessage) -> String {
    format!(
        "pgn={} ({}, {}) src={:#04x} dst={:#04x} prio={} len={} data={}",
        message.pgn,
        pgn_name(message.pgn),
        pdu_format(message.pgn),
        message.source,
        message.destination,
        message.priority,
        message.payload.len(),
        payload_hex(&message.payload)
    )
}

/// PDU1 PGNs carry a destination address, PDU2 PGNs are broadcast.
fn pdu_format(pgn: u32) -> &'static str {
    if is_pdu1(pgn) {
        "PDU1"
    } else {
        "PDU2"
    }
}

fn payload_hex(payload: &[u8]) -> String {
    payload.iter().map(|b| format!("{b:02X}")).collect()
}
