use tracing::{debug, info};
use zsock_socket::{Pattern, SocketConfig, SocketError};

use crate::cmd::{open_socket, parse_duration, RecvArgs};
use crate::exit::{socket_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat, Received};

pub fn run(args: RecvArgs, format: OutputFormat) -> CliResult<i32> {
    if !args.topics.is_empty() && !matches!(args.pattern, Pattern::Sub | Pattern::XSub) {
        return Err(CliError::new(
            USAGE,
            format!("--topic only applies to SUB and XSUB, not {}", args.pattern),
        ));
    }
    let recv_timeout = args.timeout.as_deref().map(parse_duration).transpose()?;
    let config = SocketConfig {
        recv_timeout,
        ..SocketConfig::default()
    };

    let mut socket = open_socket(args.pattern, &args.endpoint, config)?;
    if matches!(args.pattern, Pattern::Sub | Pattern::XSub) {
        let topics = if args.topics.is_empty() {
            vec![String::new()]
        } else {
            args.topics.clone()
        };
        for topic in &topics {
            socket
                .subscribe(topic.as_bytes())
                .map_err(|err| socket_error("subscribe failed", err))?;
        }
    }
    install_ctrlc_handler(socket.closer())?;
    info!(endpoints = ?socket.endpoints(), pattern = %args.pattern, "receiving");

    let mut printed = 0usize;
    loop {
        let mut frames = match socket.recv_message() {
            Ok(frames) => frames,
            Err(SocketError::Closed) => {
                debug!("socket closed, stopping");
                break;
            }
            Err(err) => return Err(socket_error("receive failed", err)),
        };

        let peer_id = if args.pattern.is_address_aware() && !frames.is_empty() {
            Some(frames.remove(0))
        } else {
            None
        };
        let received = Received {
            pattern: args.pattern.as_str(),
            peer_id: peer_id.as_ref(),
            frames: &frames,
        };
        print_message(&received, format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
        }
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(closer: zsock_socket::SocketCloser) -> CliResult<()> {
    ctrlc::set_handler(move || closer.close())
        .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
