use clap::{Args, Subcommand};
use n2kascii_codec::{BROADCAST, DEFAULT_SOURCE_ADDRESS};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode Actisense ASCII lines from a file or stdin.
    Decode(DecodeArgs),
    /// Encode one message as an Actisense ASCII line.
    Encode(EncodeArgs),
    /// Run the gateway and print every message a client sends.
    Listen(ListenArgs),
    /// Connect to a gateway and send lines.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args),
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// File to read. Default: stdin.
    pub file: Option<PathBuf>,
    /// Source address for lines whose source field is not hex.
    #[arg(long, value_parser = parse_u8, default_value_t = DEFAULT_SOURCE_ADDRESS)]
    pub default_source: u8,
    /// Only print these PGNs (comma-separated).
    #[arg(long, value_delimiter = ',', value_parser = parse_pgn)]
    pub pgns: Option<Vec<u32>>,
    /// Exit with a data error if any line is rejected.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Parameter group number (decimal or 0x-prefixed hex).
    #[arg(long, value_parser = parse_pgn)]
    pub pgn: u32,
    /// Source address.
    #[arg(long, value_parser = parse_u8, default_value = "0")]
    pub source: u8,
    /// Destination address.
    #[arg(long, value_parser = parse_u8, default_value_t = BROADCAST)]
    pub destination: u8,
    /// Priority, 0 (highest) to 7.
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=7), default_value = "6")]
    pub priority: u8,
    /// Payload as hex byte pairs, e.g. `012F30`.
    #[arg(long, default_value = "")]
    pub data: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Address to listen on. Default: the config file's `bind`.
    pub addr: Option<String>,
    /// Gateway configuration file (JSON).
    #[arg(long, value_name = "FILE", env = "N2KASCII_CONFIG")]
    pub config: Option<PathBuf>,
    /// Source address for lines whose source field is not hex.
    #[arg(long, value_parser = parse_u8)]
    pub default_source: Option<u8>,
    /// Delay between checks for a new client, in milliseconds.
    #[arg(long)]
    pub accept_interval_ms: Option<u64>,
    /// Delay between pump cycles, in milliseconds.
    #[arg(long)]
    pub pump_interval_ms: Option<u64>,
    /// Only print these PGNs (comma-separated).
    #[arg(long, value_delimiter = ',', value_parser = parse_pgn)]
    pub pgns: Option<Vec<u32>>,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Gateway address, e.g. `192.168.4.1:60001`.
    pub addr: String,
    /// Lines to send.
    #[arg(conflicts_with = "file")]
    pub lines: Vec<String>,
    /// Read lines from a file instead.
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
    /// Send lines without checking that they decode.
    #[arg(long)]
    pub raw: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse a decimal or `0x`-prefixed hexadecimal number.
fn parse_number(input: &str) -> Result<u64, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("invalid number: {input}"))
}

pub fn parse_u8(input: &str) -> Result<u8, String> {
    let value = parse_number(input)?;
    u8::try_from(value).map_err(|_| format!("address out of range (0-255): {input}"))
}

pub fn parse_pgn(input: &str) -> Result<u32, String> {
    let value = parse_number(input)?;
    if value > 0xF_FFFF {
        return Err(format!("pgn out of range (max 0xFFFFF): {input}"));
    }
    Ok(value as u32)
}
