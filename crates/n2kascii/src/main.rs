mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "n2kascii",
    version,
    about = "NMEA 2000 Actisense ASCII codec and gateway"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
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
    fn parses_encode_subcommand() {
        let cli = Cli::try_parse_from([
            "n2kascii",
            "encode",
            "--pgn",
            "0x1F513",
            "--source",
            "0x23",
            "--priority",
            "7",
            "--data",
            "012F30",
        ])
        .expect("encode args should parse");

        let Command::Encode(args) = cli.command else {
            panic!("expected encode");
        };
        assert_eq!(args.pgn, 0x1F513);
        assert_eq!(args.source, 0x23);
        assert_eq!(args.destination, 0xFF);
        assert_eq!(args.priority, 7);
    }

    #[test]
    fn rejects_priority_above_seven() {
        let err = Cli::try_parse_from(["n2kascii", "encode", "--pgn", "59904", "--priority", "8"])
            .expect_err("priority 8 should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn rejects_lines_with_file() {
        let err = Cli::try_parse_from([
            "n2kascii",
            "send",
            "127.0.0.1:60001",
            "A000000.000 0AFF2 1F112 01",
            "--file",
            "/tmp/lines.txt",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_listen_with_pgn_filter() {
        let cli = Cli::try_parse_from([
            "n2kascii",
            "--format",
            "json",
            "listen",
            "127.0.0.1:0",
            "--pgns",
            "127250,0x1F513",
            "--count",
            "2",
        ])
        .expect("listen args should parse");

        let Command::Listen(args) = cli.command else {
            panic!("expected listen");
        };
        assert_eq!(args.pgns, Some(vec![127250, 0x1F513]));
        assert_eq!(args.count, Some(2));
    }
}
