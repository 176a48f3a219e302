use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("gnsstream {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: gnsstream");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("GNSSTREAM_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "rustc: {}",
        option_env!("GNSSTREAM_RUSTC_VERSION").unwrap_or("unknown")
    );
    println!(
        "git_hash: {}",
        option_env!("GNSSTREAM_GIT_HASH").unwrap_or("unknown")
    );
    println!("features: client={}, cli=true", cfg!(feature = "client"));

    Ok(SUCCESS)
}
