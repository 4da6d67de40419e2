use std::fs;

use bytes::Bytes;
use tracing::debug;
use zsock_socket::{Socket, SocketConfig};

use crate::cmd::{open_socket, parse_duration, SendArgs};
use crate::exit::{socket_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat, Received};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let config = SocketConfig {
        identity: args.identity.as_ref().map(|id| Bytes::copy_from_slice(id.as_bytes())),
        send_timeout: Some(wait_timeout),
        recv_timeout: Some(wait_timeout),
        ..SocketConfig::default()
    };
    let frames = resolve_frames(&args)?;

    let mut socket = open_socket(args.pattern, &args.endpoint, config)?;
    socket
        .send_message(&frames)
        .map_err(|err| socket_error("send failed", err))?;
    debug!(frames = frames.len(), pattern = %args.pattern, "message sent");

    if args.wait {
        wait_for_reply(&mut socket, format)?;
    }

    Ok(SUCCESS)
}

fn wait_for_reply(socket: &mut Socket, format: OutputFormat) -> CliResult<()> {
    let mut frames = socket
        .recv_message()
        .map_err(|err| socket_error("receive failed", err))?;
    let peer_id = if socket.pattern().is_address_aware() && !frames.is_empty() {
        Some(frames.remove(0))
    } else {
        None
    };
    let received = Received {
        pattern: socket.pattern().as_str(),
        peer_id: peer_id.as_ref(),
        frames: &frames,
    };
    print_message(&received, format);
    Ok(())
}

/// The frames to send: every `--frame`, or a single frame from `--data` or
/// `--file`. With none of them the message is one empty frame.
fn resolve_frames(args: &SendArgs) -> CliResult<Vec<Vec<u8>>> {
    if !args.frames.is_empty() {
        return Ok(args.frames.iter().map(|f| f.as_bytes().to_vec()).collect());
    }
    if let Some(data) = &args.data {
        return Ok(vec![data.as_bytes().to_vec()]);
    }
    if let Some(path) = &args.file {
        let payload = fs::read(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        })?;
        return Ok(vec![payload]);
    }
    if args.pattern.is_address_aware() {
        return Err(CliError::new(
            USAGE,
            format!(
                "{} needs the peer identity as the first --frame",
                args.pattern
            ),
        ));
    }
    Ok(vec![Vec::new()])
}
