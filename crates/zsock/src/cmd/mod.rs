use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use zsock_socket::{Pattern, Socket, SocketConfig};
use zsock_transport::Direction;

use crate::exit::{socket_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod recv;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one message.
    Send(SendArgs),
    /// Receive and print messages.
    Recv(RecvArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Recv(args) => recv::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Endpoint list, e.g. `tcp://127.0.0.1:5555` or `@ipc:///tmp/a.sock,>tcp://host:1`.
    pub endpoint: String,
    /// Socket pattern.
    #[arg(long, short = 'p', default_value = "push", env = "ZSOCK_PATTERN")]
    pub pattern: Pattern,
    /// Message frame (repeat for a multipart message).
    #[arg(long = "frame", short = 'f', conflicts_with_all = ["data", "file"])]
    pub frames: Vec<String>,
    /// Single-frame string payload.
    #[arg(long, conflicts_with_all = ["frames", "file"])]
    pub data: Option<String>,
    /// Read a single-frame payload from a file.
    #[arg(long, conflicts_with_all = ["frames", "data"])]
    pub file: Option<PathBuf>,
    /// Identity announced to ROUTER/STREAM peers.
    #[arg(long, env = "ZSOCK_IDENTITY")]
    pub identity: Option<String>,
    /// Wait for one reply and print it.
    #[arg(long)]
    pub wait: bool,
    /// How long to wait for a peer, and for the reply when --wait is set
    /// (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct RecvArgs {
    /// Endpoint list, e.g. `tcp://127.0.0.1:5555` or `>ipc:///tmp/a.sock`.
    pub endpoint: String,
    /// Socket pattern.
    #[arg(long, short = 'p', default_value = "pull", env = "ZSOCK_PATTERN")]
    pub pattern: Pattern,
    /// Subscription prefix for SUB/XSUB (repeatable). Default: everything.
    #[arg(long = "topic", short = 't')]
    pub topics: Vec<String>,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Give up when no message arrives for this long (e.g. 5s, 500ms).
    #[arg(long)]
    pub timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Create a socket and attach it to `endpoint`. Entries without a sigil
/// bind for server-side patterns and connect otherwise.
pub fn open_socket(pattern: Pattern, endpoint: &str, config: SocketConfig) -> CliResult<Socket> {
    let mut socket = Socket::with_config(pattern, config)
        .map_err(|err| socket_error("invalid socket options", err))?;
    let serverish = pattern.default_direction() == Some(Direction::Bind);
    socket
        .attach(endpoint, serverish)
        .map_err(|err| socket_error("attach failed", err))?;
    Ok(socket)
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
