use std::sync::atomic::AtomicBool;
use std::sync::{Mutex, Weak};

use bytes::Bytes;
use tracing::{debug, trace};
use zsock_frame::FrameWriter;
use zsock_transport::TransportStream;

use crate::engine::Core;
use crate::pattern::Pattern;
use crate::subscription::{Subscription, TopicSet};
use crate::sync::{lock, Wait};

/// Socket-local handle of one peer connection.
pub(crate) type PipeId = u64;

/// Result of handing a message to a pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Handoff {
    Sent,
    /// The peer had no room within the allowed wait.
    Full,
    /// The peer is gone; the pipe should be detached.
    Gone,
}

/// One connection between this socket and a peer socket.
pub(crate) struct Pipe {
    id: PipeId,
    identity: Bytes,
    peer: Pattern,
    link: Link,
    /// What the peer subscribed to, for publisher patterns.
    topics: Mutex<TopicSet>,
}

enum Link {
    /// Same-process peer: messages go straight into its mailbox.
    Inproc { core: Weak<Core>, pipe: PipeId },
    /// Peer behind an ipc/tcp connection.
    Stream(Mutex<FrameWriter<TransportStream>>),
}

impl Pipe {
    pub(crate) fn inproc(
        id: PipeId,
        identity: Bytes,
        peer: Pattern,
        peer_core: Weak<Core>,
        peer_pipe: PipeId,
    ) -> Self {
        Self::with_link(
            id,
            identity,
            peer,
            Link::Inproc {
                core: peer_core,
                pipe: peer_pipe,
            },
        )
    }

    pub(crate) fn stream(
        id: PipeId,
        identity: Bytes,
        peer: Pattern,
        writer: FrameWriter<TransportStream>,
    ) -> Self {
        Self::with_link(id, identity, peer, Link::Stream(Mutex::new(writer)))
    }

    fn with_link(id: PipeId, identity: Bytes, peer: Pattern, link: Link) -> Self {
        Self {
            id,
            identity,
            peer,
            link,
            topics: Mutex::new(TopicSet::default()),
        }
    }

    pub(crate) fn id(&self) -> PipeId {
        self.id
    }

    pub(crate) fn identity(&self) -> &Bytes {
        &self.identity
    }

    pub(crate) fn peer(&self) -> Pattern {
        self.peer
    }

    /// Hand one whole message to the peer. A same-process handoff blocked on
    /// a full peer gives up once `sender_closed` is set.
    pub(crate) fn send(
        &self,
        frames: Vec<Bytes>,
        wait: Wait,
        sender_closed: &AtomicBool,
    ) -> Handoff {
        match &self.link {
            Link::Inproc { core, pipe } => {
                let Some(peer) = core.upgrade() else {
                    return Handoff::Gone;
                };
                match peer.deliver(*pipe, frames, wait, Some(sender_closed)) {
                    Ok(true) => Handoff::Sent,
                    Ok(false) => Handoff::Full,
                    Err(_) => Handoff::Gone,
                }
            }
            Link::Stream(writer) => match lock(writer).write_message(&frames) {
                Ok(()) => Handoff::Sent,
                Err(err) => {
                    debug!(pipe = self.id, error = %err, "stream write failed");
                    Handoff::Gone
                }
            },
        }
    }

    /// Tell the peer about a subscription change.
    pub(crate) fn send_subscription(&self, change: &Subscription) -> Handoff {
        match &self.link {
            Link::Inproc { core, pipe } => match core.upgrade() {
                Some(peer) => {
                    peer.command(*pipe, &change.encode());
                    Handoff::Sent
                }
                None => Handoff::Gone,
            },
            Link::Stream(writer) => match lock(writer).send_command(&change.encode()) {
                Ok(()) => Handoff::Sent,
                Err(err) => {
                    debug!(pipe = self.id, error = %err, "stream command write failed");
                    Handoff::Gone
                }
            },
        }
    }

    /// Whether a message could be handed over right now without waiting.
    pub(crate) fn has_room(&self) -> bool {
        match &self.link {
            Link::Inproc { core, .. } => core.upgrade().is_some_and(|peer| peer.has_room()),
            // The kernel buffers stream writes.
            Link::Stream(_) => true,
        }
    }

    /// Detach the far end of a same-process pipe and release any of our
    /// sends still parked on its mailbox.
    pub(crate) fn disconnect_peer(&self) {
        if let Link::Inproc { core, pipe } = &self.link {
            if let Some(peer) = core.upgrade() {
                peer.detach(*pipe);
                peer.wake_senders();
            }
        }
    }

    pub(crate) fn apply_subscription(&self, change: &Subscription) {
        trace!(pipe = self.id, ?change, "subscription update");
        lock(&self.topics).apply(change);
    }

    pub(crate) fn wants(&self, first_frame: &[u8]) -> bool {
        lock(&self.topics).matches(first_frame)
    }
}

impl std::fmt::Debug for Pipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let transport = match &self.link {
            Link::Inproc { .. } => "inproc",
            Link::Stream(_) => "stream",
        };
        f.debug_struct("Pipe")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .field("peer", &self.peer)
            .field("transport", &transport)
            .finish()
    }
}
