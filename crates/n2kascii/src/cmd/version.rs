use n2kascii_codec::{DEFAULT_LINE_CAPACITY, MAX_PAYLOAD_LEN};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("n2kascii {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: n2kascii");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("N2KASCII_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("N2KASCII_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!(
        "features: gateway={}, async={}, cli=true",
        cfg!(feature = "gateway"),
        cfg!(feature = "async")
    );
    println!("max_payload: {MAX_PAYLOAD_LEN}");
    println!("line_capacity: {DEFAULT_LINE_CAPACITY}");

    Ok(SUCCESS)
}
