use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("zsock {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: zsock");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "protocol: {}/{}",
        zsock_socket::PROTOCOL_NAME,
        zsock_socket::PROTOCOL_VERSION
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("ZSOCK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "transports: inproc, tcp{}",
        if cfg!(unix) { ", ipc" } else { "" }
    );

    Ok(SUCCESS)
}
