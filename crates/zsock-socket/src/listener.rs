use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};
use zsock_transport::{Endpoint, Listener, TransportError};

use crate::engine::{Core, ListenerHandle};
use crate::error::{Result, SocketError};
use crate::session;

/// Bind an ipc/tcp endpoint and start accepting peers in the background.
///
/// Returns the endpoint actually bound, with an ephemeral TCP port resolved.
pub(crate) fn bind(core: &Arc<Core>, endpoint: &Endpoint) -> Result<Endpoint> {
    let listener = Listener::bind(endpoint)
        .map_err(|err| SocketError::from_endpoint(&endpoint.to_string(), err))?;
    let local = listener.local_endpoint();
    let waker = listener.waker();

    let accept_core = Arc::clone(core);
    let accept_endpoint = local.to_string();
    let thread = thread::Builder::new()
        .name(format!("zsock-accept-{}", core.pattern()))
        .spawn(move || accept_loop(&accept_core, &listener, &accept_endpoint))
        .map_err(TransportError::Io)?;

    core.add_listener(ListenerHandle { waker, thread });
    info!(endpoint = %local, pattern = %core.pattern(), "listening");
    Ok(local)
}

fn accept_loop(core: &Arc<Core>, listener: &Listener, endpoint: &str) {
    loop {
        let accepted = listener.accept();
        if core.is_closed() {
            break;
        }
        let stream = match accepted {
            Ok(stream) => stream,
            Err(err) => {
                warn!(endpoint, error = %err, "accept failed");
                if !core.pause(core.config().reconnect_interval) {
                    break;
                }
                continue;
            }
        };

        debug!(
            endpoint,
            transport = stream.transport_name(),
            peer_credentials = ?stream.peer_credentials(),
            "accepted connection"
        );
        let conn_core = Arc::clone(core);
        let conn_endpoint = endpoint.to_string();
        let spawned = thread::Builder::new()
            .name("zsock-conn".to_string())
            .spawn(move || {
                if let Err(err) = session::run(&conn_core, stream, &conn_endpoint) {
                    if !conn_core.is_closed() {
                        warn!(endpoint = %conn_endpoint, error = %err, "peer connection failed");
                    }
                }
            });
        if let Err(err) = spawned {
            warn!(endpoint, error = %err, "could not start connection thread");
        }
    }
    debug!(endpoint, "accept loop stopped");
}
