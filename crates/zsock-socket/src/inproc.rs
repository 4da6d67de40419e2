//! Process-wide registry of `inproc://` names.
//!
//! Connecting to a name nobody has bound yet is allowed: the connection is
//! parked and completed when the bind happens.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, Weak};

use tracing::{debug, warn};

use crate::engine::Core;
use crate::error::{Result, SocketError};
use crate::pipe::Pipe;
use crate::sync::lock;

enum Slot {
    Bound(Weak<Core>),
    Pending(Vec<Weak<Core>>),
}

static REGISTRY: LazyLock<Mutex<HashMap<String, Slot>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Bind `name` to `core` and complete any connections waiting for it.
pub(crate) fn bind(core: &Arc<Core>, name: &str) -> Result<()> {
    let waiting = {
        let mut registry = lock(&REGISTRY);
        let waiting = match registry.get_mut(name) {
            Some(Slot::Bound(existing)) if existing.strong_count() > 0 => {
                return Err(SocketError::invalid_endpoint(
                    &format!("inproc://{name}"),
                    "address already in use",
                ));
            }
            Some(Slot::Pending(waiting)) => std::mem::take(waiting),
            _ => Vec::new(),
        };
        registry.insert(name.to_string(), Slot::Bound(Arc::downgrade(core)));
        waiting
    };
    core.add_inproc_name(name.to_string());
    debug!(name, pattern = %core.pattern(), "inproc name bound");

    for connector in waiting.iter().filter_map(Weak::upgrade) {
        if connector.is_closed() {
            continue;
        }
        if let Err(err) = link(core, &connector) {
            warn!(name, error = %err, "deferred inproc connection rejected");
        }
    }
    Ok(())
}

/// Connect `core` to `name`, now if it is bound or once it gets bound.
pub(crate) fn connect(core: &Arc<Core>, name: &str) -> Result<()> {
    let binder = {
        let mut registry = lock(&REGISTRY);
        let bound = match registry.get(name) {
            Some(Slot::Bound(binder)) => binder.upgrade(),
            _ => None,
        };
        match bound {
            Some(binder) => binder,
            None => {
                match registry.get_mut(name) {
                    Some(Slot::Pending(waiting)) => {
                        waiting.retain(|w| w.strong_count() > 0);
                        waiting.push(Arc::downgrade(core));
                    }
                    _ => {
                        registry.insert(
                            name.to_string(),
                            Slot::Pending(vec![Arc::downgrade(core)]),
                        );
                    }
                }
                debug!(name, pattern = %core.pattern(), "inproc connect deferred until bind");
                return Ok(());
            }
        }
    };
    link(&binder, core)
}

/// Release `name` if `core` is the socket bound to it.
pub(crate) fn unbind(name: &str, core: &Core) {
    let mut registry = lock(&REGISTRY);
    if let Some(Slot::Bound(bound)) = registry.get(name) {
        if std::ptr::eq(bound.as_ptr(), core) {
            registry.remove(name);
            debug!(name, "inproc name released");
        }
    }
}

/// Create the pipe pair between a bound socket and a connecting one.
///
/// Publishers are attached before subscribers so the subscriptions a
/// subscriber replays on attach find their pipe.
fn link(binder: &Arc<Core>, connector: &Arc<Core>) -> Result<()> {
    if !connector.pattern().is_compatible(binder.pattern()) {
        return Err(SocketError::IncompatiblePattern {
            local: connector.pattern(),
            remote: binder.pattern(),
        });
    }

    let (first, second) = if binder.pattern().is_subscriber() {
        (connector, binder)
    } else {
        (binder, connector)
    };
    let first_id = first.next_pipe_id();
    let second_id = second.next_pipe_id();

    let first_pipe = {
        let peer = Arc::downgrade(second);
        let peer_pattern = second.pattern();
        first.attach(peer_pattern, second.config().identity.clone(), |identity| {
            Pipe::inproc(first_id, identity, peer_pattern, peer, second_id)
        })?
    };

    let peer = Arc::downgrade(first);
    let peer_pattern = first.pattern();
    let attached = second.attach(peer_pattern, first.config().identity.clone(), |identity| {
        Pipe::inproc(second_id, identity, peer_pattern, peer, first_id)
    });
    if let Err(err) = attached {
        first.detach(first_pipe.id());
        return Err(err);
    }
    Ok(())
}
