use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};

use bytes::Bytes;

use crate::error::{Result, SocketError};
use crate::pipe::PipeId;
use crate::sync::{lock, Wait};

/// One complete inbound message and the pipe it arrived on.
#[derive(Debug)]
pub(crate) struct Delivery {
    pub(crate) pipe: PipeId,
    pub(crate) frames: Vec<Bytes>,
}

/// Bounded inbound queue shared between a socket and its pipes.
///
/// Messages are queued whole, so frames of different messages never
/// interleave.
pub(crate) struct Mailbox {
    state: Mutex<MailboxState>,
    readable: Condvar,
    writable: Condvar,
    capacity: usize,
}

struct MailboxState {
    queue: VecDeque<Delivery>,
    closed: bool,
}

impl Mailbox {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(MailboxState {
                queue: VecDeque::new(),
                closed: false,
            }),
            readable: Condvar::new(),
            writable: Condvar::new(),
            capacity,
        }
    }

    /// Queue a message. Returns `Ok(false)` when the queue stayed full for
    /// the whole `wait` and the message was not queued.
    ///
    /// `sender_closed` is the sending socket's closed flag; a push parked on
    /// a full queue fails with `Closed` once it is set and
    /// [`wake_senders`](Self::wake_senders) runs.
    pub(crate) fn push(
        &self,
        delivery: Delivery,
        wait: Wait,
        sender_closed: Option<&AtomicBool>,
    ) -> Result<bool> {
        let mut state = lock(&self.state);
        loop {
            if state.closed || sender_closed.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
                return Err(SocketError::Closed);
            }
            if state.queue.len() < self.capacity {
                state.queue.push_back(delivery);
                self.readable.notify_one();
                return Ok(true);
            }
            state = match wait.park(&self.writable, state) {
                Some(state) => state,
                None => return Ok(false),
            };
        }
    }

    /// Take the oldest message.
    pub(crate) fn pop(&self, wait: Wait) -> Result<Delivery> {
        let mut state = lock(&self.state);
        loop {
            if state.closed {
                return Err(SocketError::Closed);
            }
            if let Some(delivery) = state.queue.pop_front() {
                self.writable.notify_one();
                return Ok(delivery);
            }
            state = match wait.park(&self.readable, state) {
                Some(state) => state,
                None => return Err(SocketError::WouldBlock),
            };
        }
    }

    pub(crate) fn is_readable(&self) -> bool {
        let state = lock(&self.state);
        !state.closed && !state.queue.is_empty()
    }

    pub(crate) fn has_room(&self) -> bool {
        let state = lock(&self.state);
        !state.closed && state.queue.len() < self.capacity
    }

    /// Make parked pushers re-check their sender's closed flag.
    pub(crate) fn wake_senders(&self) {
        let _state = lock(&self.state);
        self.writable.notify_all();
    }

    /// Drop queued messages and fail every current and future caller.
    pub(crate) fn close(&self) {
        let mut state = lock(&self.state);
        state.closed = true;
        state.queue.clear();
        self.readable.notify_all();
        self.writable.notify_all();
    }
}
