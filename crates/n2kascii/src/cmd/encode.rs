use n2kascii_codec::{encode, WireMessage, DEFAULT_ENCODE_CAPACITY};

use crate::cmd::EncodeArgs;
use crate::exit::{codec_error, CliError, CliResult, SUCCESS, USAGE};

pub fn run(args: EncodeArgs) -> CliResult<i32> {
    let payload = parse_payload(&args.data)?;
    let message = WireMessage::new(
        args.pgn,
        args.source,
        args.destination,
        args.priority,
        payload,
    )
    .map_err(|err| codec_error("invalid message", err))?;
    let line = encode(&message, DEFAULT_ENCODE_CAPACITY)
        .map_err(|err| codec_error("encode failed", err))?;

    println!("{line}");
    Ok(SUCCESS)
}

/// Parse hex byte pairs. Whitespace between pairs is ignored.
fn parse_payload(input: &str) -> CliResult<Vec<u8>> {
    let digits: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return Err(CliError::new(
            USAGE,
            "--data must contain whole hex byte pairs",
        ));
    }

    digits
        .chunks_exact(2)
        .map(|pair| match (hex_value(pair[0]), hex_value(pair[1])) {
            (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
            _ => Err(CliError::new(
                USAGE,
                format!("--data has invalid hex: {}", String::from_utf8_lossy(pair)),
            )),
        })
        .collect()
}

fn hex_value(digit: u8) -> Option<u8> {
    char::from(digit).to_digit(16).map(|v| v as u8)
}
