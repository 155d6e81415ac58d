use std::fs::File;
use std::io::{self, BufRead, BufReader};

use n2kascii_codec::{decode_with, CodecError, DecodeOptions, WireMessage};
use tracing::debug;

use crate::cmd::DecodeArgs;
use crate::exit::{io_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_messages, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let reader: Box<dyn BufRead> = match &args.file {
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };

    let options = DecodeOptions {
        source_fallback: Some(args.default_source),
        ..DecodeOptions::default()
    };

    let report = decode_lines(reader, &options, args.pgns.as_deref())
        .map_err(|err| io_error("read failed", err))?;
    for (line, err) in &report.rejected {
        eprintln!("line {line}: {err}");
    }

    debug!(
        decoded = report.messages.len(),
        rejected = report.rejected.len(),
        "decode finished"
    );
    print_messages(&report.messages, format);

    if args.strict && !report.rejected.is_empty() {
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}

#[derive(Debug, Default)]
struct DecodeReport {
    messages: Vec<WireMessage>,
    /// One-based line number and the reason it was rejected.
    rejected: Vec<(usize, CodecError)>,
}

/// Decode every line of `reader`. Lines are raw bytes, so a line that is not
/// UTF-8 is rejected like any other malformed line.
fn decode_lines(
    mut reader: impl BufRead,
    options: &DecodeOptions,
    pgns: Option<&[u32]>,
) -> io::Result<DecodeReport> {
    let mut report = DecodeReport::default();
    let mut buf = Vec::new();
    let mut line = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(report);
        }
        line += 1;
        if buf.ends_with(b"\n") {
            buf.pop();
        }
        if buf.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match decode_with(&buf, options) {
            Ok(message) => {
                if pgns.is_some_and(|pgns| !pgns.contains(&message.pgn)) {
                    continue;
                }
                report.messages.push(message);
            }
            Err(err) => report.rejected.push((line, err)),
        }
    }
}
