use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;
use zsock_frame::{Frame, FrameConfig, FrameError, FrameReader, FrameWriter};
use zsock_transport::TransportStream;

use crate::engine::Core;
use crate::error::{Result, SocketError};
use crate::greeting::{self, Greeting, MAX_GREETING_PAYLOAD};
use crate::pipe::{Pipe, PipeId};
use crate::sync::Wait;

/// Drive one ipc/tcp connection until it ends: greet the peer, attach a
/// pipe, then feed inbound messages to the socket.
///
/// Returns `Ok(())` when the peer hangs up and `Err(Closed)` when the local
/// socket was closed.
pub(crate) fn run(core: &Arc<Core>, stream: TransportStream, endpoint: &str) -> Result<()> {
    let token = core.track_stream(&stream)?;
    let result = serve(core, stream, endpoint);
    core.untrack_stream(token);
    if core.is_closed() {
        return Err(SocketError::Closed);
    }
    result
}

fn serve(core: &Arc<Core>, stream: TransportStream, endpoint: &str) -> Result<()> {
    let config = core.config();
    let transport = stream.transport_name();
    let greeting_config = FrameConfig {
        max_payload_size: MAX_GREETING_PAYLOAD,
        read_timeout: Some(config.greeting_timeout),
        write_timeout: Some(config.greeting_timeout),
    };

    let mut reader = FrameReader::with_config_stream(stream.try_clone()?, greeting_config.clone())?;
    let mut writer = FrameWriter::with_config_stream(stream, greeting_config)?;

    let local = Greeting::new(core.pattern(), config.identity.as_ref());
    let remote = greeting::exchange(&mut reader, &mut writer, &local, config.greeting_timeout)?;

    // The greeting budget only applies before the peer is known.
    reader.set_max_payload_size(config.max_frame_size);
    writer.set_max_payload_size(config.max_frame_size);
    reader.set_read_timeout(None)?;
    writer.set_write_timeout(config.send_timeout)?;

    let id = core.next_pipe_id();
    let peer = remote.pattern;
    core.attach(peer, remote.identity_bytes(), |identity| {
        Pipe::stream(id, identity, peer, writer)
    })?;
    debug!(endpoint, transport, peer = %peer, pipe = id, "stream peer ready");

    let result = read_loop(core, id, &mut reader);
    core.detach(id);
    result
}

fn read_loop(core: &Core, pipe: PipeId, reader: &mut FrameReader<TransportStream>) -> Result<()> {
    loop {
        let frames = match reader.read_message() {
            Ok(frames) => frames,
            Err(FrameError::ConnectionClosed) => {
                debug!(pipe, "peer closed the connection");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        if let [frame] = frames.as_slice() {
            if frame.is_command() {
                core.command(pipe, frame.data());
                continue;
            }
        }

        let frames: Vec<Bytes> = frames.into_iter().map(Frame::into_data).collect();
        core.deliver(pipe, frames, Wait::Block, None)?;
    }
}
