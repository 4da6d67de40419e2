use std::sync::Arc;
use std::thread;

use tracing::{debug, trace, warn};
use zsock_transport::{Endpoint, TransportError};

use crate::engine::Core;
use crate::error::Result;
use crate::session;

/// Start connecting to an ipc/tcp endpoint in the background.
///
/// The connector keeps retrying at the configured interval until the peer
/// is reachable, and reconnects after the peer goes away, until the socket
/// is closed.
pub(crate) fn connect(core: &Arc<Core>, endpoint: Endpoint) -> Result<()> {
    let worker_core = Arc::clone(core);
    thread::Builder::new()
        .name(format!("zsock-connect-{}", core.pattern()))
        .spawn(move || connect_loop(&worker_core, &endpoint))
        .map_err(TransportError::Io)?;
    Ok(())
}

fn connect_loop(core: &Arc<Core>, endpoint: &Endpoint) {
    let target = endpoint.to_string();
    let interval = core.config().reconnect_interval;

    while !core.is_closed() {
        match zsock_transport::connect(endpoint) {
            Ok(stream) => {
                debug!(endpoint = %target, pattern = %core.pattern(), "connected");
                match session::run(core, stream, &target) {
                    Ok(()) => debug!(endpoint = %target, "disconnected, will reconnect"),
                    Err(_) if core.is_closed() => break,
                    Err(err) => warn!(endpoint = %target, error = %err, "connection failed"),
                }
            }
            Err(err) => trace!(endpoint = %target, error = %err, "connect attempt failed"),
        }
        if !core.pause(interval) {
            break;
        }
    }
    debug!(endpoint = %target, "connector stopped");
}
