use std::fs;

use n2kascii_codec::decode_str;
use n2kascii_transport::{connect, ByteSink};
use tracing::info;

use crate::cmd::SendArgs;
use crate::exit::{codec_error, io_error, transport_error, CliError, CliResult, SUCCESS, USAGE};

pub fn run(args: SendArgs) -> CliResult<i32> {
    let lines = resolve_lines(&args)?;
    if lines.is_empty() {
        return Err(CliError::new(USAGE, "nothing to send"));
    }
    if !args.raw {
        check_lines(&lines)?;
    }

    let mut stream =
        connect(args.addr.as_str()).map_err(|err| transport_error("connect failed", err))?;
    for line in &lines {
        stream
            .write_line(line)
            .map_err(|err| transport_error("send failed", err))?;
    }

    info!(addr = %args.addr, lines = lines.len(), "lines sent");
    Ok(SUCCESS)
}

fn resolve_lines(args: &SendArgs) -> CliResult<Vec<String>> {
    let lines = match &args.file {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?
            .lines()
            .map(str::to_string)
            .collect(),
        None => args.lines.clone(),
    };
    Ok(lines
        .into_iter()
        .map(|line| line.trim_end_matches(['\r', '\n']).to_string())
        .filter(|line| !line.trim().is_empty())
        .collect())
}

fn check_lines(lines: &[String]) -> CliResult<()> {
    for (index, line) in lines.iter().enumerate() {
        decode_str(line).map_err(|err| codec_error(&format!("line {}", index + 1), err))?;
    }
    Ok(())
}
