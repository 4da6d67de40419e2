use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace, warn};
use zsock_transport::TransportStream;

use crate::config::SocketConfig;
use crate::error::{Result, SocketError};
use crate::inproc;
use crate::mailbox::{Delivery, Mailbox};
use crate::pattern::Pattern;
use crate::pipe::{Handoff, Pipe, PipeId};
use crate::subscription::{Subscription, TopicSet};
use crate::sync::{lock, Wait};

/// A bound stream listener: its accept thread and how to unblock it.
pub(crate) struct ListenerHandle {
    pub(crate) waker: Box<dyn Fn() + Send + Sync>,
    pub(crate) thread: JoinHandle<()>,
}

/// State shared between a [`Socket`](crate::Socket), its pipes and its
/// background threads.
pub(crate) struct Core {
    pattern: Pattern,
    config: SocketConfig,
    mailbox: Mailbox,
    state: Mutex<PipeTable>,
    changed: Condvar,
    /// Mirrors `PipeTable::closed` for sends parked in a peer's mailbox.
    closing: AtomicBool,
    /// Topics this socket subscribed to (SUB/XSUB), replayed to new pipes.
    subscriptions: Mutex<TopicSet>,
    streams: Mutex<HashMap<u64, TransportStream>>,
    listeners: Mutex<Vec<ListenerHandle>>,
    inproc_names: Mutex<Vec<String>>,
    next_id: AtomicU64,
    next_identity: AtomicU32,
}

struct PipeTable {
    pipes: Vec<Arc<Pipe>>,
    cursor: usize,
    closed: bool,
}

impl Core {
    pub(crate) fn new(pattern: Pattern, config: SocketConfig) -> Arc<Self> {
        Arc::new(Self {
            pattern,
            mailbox: Mailbox::new(config.recv_hwm),
            config,
            state: Mutex::new(PipeTable {
                pipes: Vec::new(),
                cursor: 0,
                closed: false,
            }),
            changed: Condvar::new(),
            closing: AtomicBool::new(false),
            subscriptions: Mutex::new(TopicSet::default()),
            streams: Mutex::new(HashMap::new()),
            listeners: Mutex::new(Vec::new()),
            inproc_names: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            next_identity: AtomicU32::new(1),
        })
    }

    pub(crate) fn pattern(&self) -> Pattern {
        self.pattern
    }

    pub(crate) fn config(&self) -> &SocketConfig {
        &self.config
    }

    pub(crate) fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    pub(crate) fn next_pipe_id(&self) -> PipeId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn generate_identity(&self) -> Bytes {
        let n = self.next_identity.fetch_add(1, Ordering::Relaxed);
        let mut id = BytesMut::with_capacity(5);
        id.put_u8(0);
        id.put_u32(n);
        id.freeze()
    }

    /// Register a new peer connection.
    ///
    /// The peer keeps the identity it asked for unless another pipe already
    /// uses it. Subscriber patterns replay their topics to the new pipe.
    pub(crate) fn attach(
        &self,
        peer: Pattern,
        requested_identity: Option<Bytes>,
        make: impl FnOnce(Bytes) -> Pipe,
    ) -> Result<Arc<Pipe>> {
        let topics = self
            .pattern
            .is_subscriber()
            .then(|| lock(&self.subscriptions));

        let pipe = {
            let mut state = lock(&self.state);
            if state.closed {
                return Err(SocketError::Closed);
            }
            if self.pattern == Pattern::Pair && !state.pipes.is_empty() {
                return Err(SocketError::InvalidState("PAIR socket already has a peer"));
            }
            let identity = match requested_identity {
                Some(id) if !state.pipes.iter().any(|p| p.identity() == &id) => id,
                _ => self.generate_identity(),
            };
            let pipe = Arc::new(make(identity));
            state.pipes.push(Arc::clone(&pipe));
            self.changed.notify_all();
            pipe
        };
        debug!(
            pattern = %self.pattern,
            pipe = pipe.id(),
            peer = %pipe.peer(),
            "pipe attached"
        );

        if let Some(topics) = topics {
            for topic in topics.iter() {
                pipe.send_subscription(&Subscription::Subscribe(topic.clone()));
            }
        }
        Ok(pipe)
    }

    pub(crate) fn detach(&self, id: PipeId) {
        let removed = {
            let mut state = lock(&self.state);
            match state.pipes.iter().position(|p| p.id() == id) {
                Some(index) => {
                    state.pipes.remove(index);
                    if state.cursor > index {
                        state.cursor -= 1;
                    }
                    self.changed.notify_all();
                    true
                }
                None => false,
            }
        };
        if removed {
            debug!(pattern = %self.pattern, pipe = id, "pipe detached");
        }
    }

    fn pipe(&self, id: PipeId) -> Option<Arc<Pipe>> {
        lock(&self.state)
            .pipes
            .iter()
            .find(|p| p.id() == id)
            .cloned()
    }

    fn snapshot(&self) -> Vec<Arc<Pipe>> {
        lock(&self.state).pipes.clone()
    }

    pub(crate) fn peer_count(&self) -> usize {
        lock(&self.state).pipes.len()
    }

    /// Queue an inbound message from `pipe`. Address-aware patterns get the
    /// pipe identity prepended.
    /// `sender_closed` lets a same-process sender abandon a blocked push
    /// when its own socket closes.
    pub(crate) fn deliver(
        &self,
        pipe: PipeId,
        frames: Vec<Bytes>,
        wait: Wait,
        sender_closed: Option<&AtomicBool>,
    ) -> Result<bool> {
        let frames = if self.pattern.is_address_aware() {
            let Some(source) = self.pipe(pipe) else {
                return Err(SocketError::Closed);
            };
            let mut addressed = Vec::with_capacity(frames.len() + 1);
            addressed.push(source.identity().clone());
            addressed.extend(frames);
            addressed
        } else {
            frames
        };
        self.mailbox.push(Delivery { pipe, frames }, wait, sender_closed)
    }

    /// Wake sends parked on this socket's full mailbox.
    pub(crate) fn wake_senders(&self) {
        self.mailbox.wake_senders();
    }

    /// Handle a command frame from `pipe`.
    pub(crate) fn command(&self, pipe: PipeId, payload: &Bytes) {
        let Some(change) = Subscription::decode(payload) else {
            trace!(pipe, "ignoring unknown command");
            return;
        };
        if !self.pattern.is_publisher() {
            trace!(pipe, pattern = %self.pattern, "ignoring subscription on non-publisher");
            return;
        }
        let Some(source) = self.pipe(pipe) else {
            return;
        };
        source.apply_subscription(&change);

        if self.pattern == Pattern::XPub {
            let delivery = Delivery {
                pipe,
                frames: vec![payload.clone()],
            };
            if !matches!(self.mailbox.push(delivery, Wait::Poll, None), Ok(true)) {
                trace!(pipe, "subscription message dropped");
            }
        }
    }

    pub(crate) fn recv(&self, wait: Wait) -> Result<Delivery> {
        self.mailbox.pop(wait)
    }

    pub(crate) fn is_readable(&self) -> bool {
        self.mailbox.is_readable()
    }

    pub(crate) fn has_room(&self) -> bool {
        self.mailbox.has_room()
    }

    /// Whether a send would go through without waiting.
    pub(crate) fn is_writable(&self) -> bool {
        if self.is_closed() {
            return false;
        }
        match self.pattern {
            Pattern::Pull | Pattern::Sub => false,
            // Never block: unmatched or full peers just miss the message.
            Pattern::Pub | Pattern::XPub | Pattern::Router | Pattern::Stream => true,
            Pattern::Push
            | Pattern::Req
            | Pattern::Rep
            | Pattern::Dealer
            | Pattern::XSub
            | Pattern::Pair => self.snapshot().iter().any(|pipe| pipe.has_room()),
        }
    }

    /// Route one outbound message by pattern. Returns the pipe it went to
    /// when the pattern picks a single peer.
    pub(crate) fn route(
        &self,
        frames: Vec<Bytes>,
        wait: Wait,
        reply_to: Option<PipeId>,
    ) -> Result<Option<PipeId>> {
        match self.pattern {
            Pattern::Push | Pattern::Dealer | Pattern::Req | Pattern::Pair => {
                self.send_round_robin(frames, wait).map(Some)
            }
            Pattern::Rep => {
                let pipe =
                    reply_to.ok_or(SocketError::InvalidState("no request to reply to"))?;
                self.send_to(pipe, frames, wait)?;
                Ok(Some(pipe))
            }
            Pattern::Router | Pattern::Stream => self.send_by_identity(frames, wait),
            Pattern::Pub | Pattern::XPub => {
                self.publish(frames, true);
                Ok(None)
            }
            Pattern::XSub => {
                match single_subscription(&frames) {
                    Some(change) => self.change_subscription(change),
                    None => self.publish(frames, false),
                }
                Ok(None)
            }
            Pattern::Pull | Pattern::Sub => Err(SocketError::Unsupported {
                pattern: self.pattern,
                operation: "send",
            }),
        }
    }

    /// Pick the next pipe, preferring one with room.
    fn next_pipe(&self, wait: Wait) -> Result<Arc<Pipe>> {
        let mut state = lock(&self.state);
        loop {
            if state.closed {
                return Err(SocketError::Closed);
            }
            let count = state.pipes.len();
            if count > 0 {
                let start = state.cursor % count;
                let index = (0..count)
                    .map(|offset| (start + offset) % count)
                    .find(|&index| state.pipes[index].has_room())
                    .unwrap_or(start);
                state.cursor = index + 1;
                return Ok(Arc::clone(&state.pipes[index]));
            }
            state = wait
                .park(&self.changed, state)
                .ok_or(SocketError::WouldBlock)?;
        }
    }

    fn send_round_robin(&self, frames: Vec<Bytes>, wait: Wait) -> Result<PipeId> {
        loop {
            let pipe = self.next_pipe(wait)?;
            match pipe.send(frames.clone(), wait, &self.closing) {
                Handoff::Sent => return Ok(pipe.id()),
                Handoff::Full => return Err(SocketError::WouldBlock),
                Handoff::Gone => self.detach(pipe.id()),
            }
        }
    }

    fn send_to(&self, id: PipeId, frames: Vec<Bytes>, wait: Wait) -> Result<()> {
        let Some(pipe) = self.pipe(id) else {
            trace!(pipe = id, "dropping reply, peer went away");
            return Ok(());
        };
        self.hand_off(&pipe, frames, wait)
    }

    fn send_by_identity(&self, mut frames: Vec<Bytes>, wait: Wait) -> Result<Option<PipeId>> {
        let identity = frames.remove(0);
        if frames.is_empty() {
            trace!(?identity, "dropping message with no body");
            return Ok(None);
        }
        let target = lock(&self.state)
            .pipes
            .iter()
            .find(|p| p.identity() == &identity)
            .cloned();
        let Some(pipe) = target else {
            trace!(?identity, "dropping message for unknown peer");
            return Ok(None);
        };
        self.hand_off(&pipe, frames, wait)?;
        Ok(Some(pipe.id()))
    }

    fn hand_off(&self, pipe: &Pipe, frames: Vec<Bytes>, wait: Wait) -> Result<()> {
        match pipe.send(frames, wait, &self.closing) {
            Handoff::Sent => Ok(()),
            Handoff::Full => Err(SocketError::WouldBlock),
            Handoff::Gone => {
                self.detach(pipe.id());
                if self.is_closed() {
                    return Err(SocketError::Closed);
                }
                trace!(pipe = pipe.id(), "dropping message, peer went away");
                Ok(())
            }
        }
    }

    /// Fan a message out without waiting on any peer.
    fn publish(&self, frames: Vec<Bytes>, filtered: bool) {
        let first = frames.first().cloned().unwrap_or_default();
        for pipe in self.snapshot() {
            if filtered && !pipe.wants(&first) {
                continue;
            }
            match pipe.send(frames.clone(), Wait::Poll, &self.closing) {
                Handoff::Sent => {}
                Handoff::Full => trace!(pipe = pipe.id(), "peer queue full, message dropped"),
                Handoff::Gone => self.detach(pipe.id()),
            }
        }
    }

    /// Record a subscription change and forward it to every peer.
    pub(crate) fn change_subscription(&self, change: Subscription) {
        let mut topics = lock(&self.subscriptions);
        topics.apply(&change);
        for pipe in self.snapshot() {
            if pipe.send_subscription(&change) == Handoff::Gone {
                self.detach(pipe.id());
            }
        }
    }

    /// Sleep for `interval` unless the socket closes first. Returns false
    /// once closed.
    pub(crate) fn pause(&self, interval: Duration) -> bool {
        let state = lock(&self.state);
        if state.closed {
            return false;
        }
        let (state, _) = self
            .changed
            .wait_timeout_while(state, interval, |state| !state.closed)
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        !state.closed
    }

    /// Track a live stream connection so shutdown can break it. Fails (and
    /// closes the stream) if the socket is already closed.
    pub(crate) fn track_stream(&self, stream: &TransportStream) -> Result<u64> {
        let clone = stream.try_clone()?;
        let mut streams = lock(&self.streams);
        if self.is_closed() {
            let _ = clone.shutdown();
            return Err(SocketError::Closed);
        }
        let token = self.next_pipe_id();
        streams.insert(token, clone);
        Ok(token)
    }

    pub(crate) fn untrack_stream(&self, token: u64) {
        lock(&self.streams).remove(&token);
    }

    pub(crate) fn add_listener(&self, handle: ListenerHandle) {
        lock(&self.listeners).push(handle);
    }

    pub(crate) fn add_inproc_name(&self, name: String) {
        lock(&self.inproc_names).push(name);
    }

    /// Close the socket: fail blocked callers, drop every peer, stop
    /// background threads and release bound names. Idempotent.
    pub(crate) fn shutdown(&self) {
        let pipes = {
            let mut state = lock(&self.state);
            if state.closed {
                return;
            }
            state.closed = true;
            self.closing.store(true, Ordering::SeqCst);
            self.changed.notify_all();
            std::mem::take(&mut state.pipes)
        };
        self.mailbox.close();

        for pipe in &pipes {
            pipe.disconnect_peer();
        }
        for (_, stream) in lock(&self.streams).drain() {
            let _ = stream.shutdown();
        }
        for name in lock(&self.inproc_names).drain(..) {
            inproc::unbind(&name, self);
        }

        let listeners = std::mem::take(&mut *lock(&self.listeners));
        for listener in &listeners {
            (listener.waker)();
        }
        for listener in listeners {
            if listener.thread.join().is_err() {
                warn!(pattern = %self.pattern, "accept thread panicked");
            }
        }
        debug!(pattern = %self.pattern, peers = pipes.len(), "socket closed");
    }
}

fn single_subscription(frames: &[Bytes]) -> Option<Subscription> {
    match frames {
        [only] => Subscription::decode(only),
        _ => None,
    }
}
