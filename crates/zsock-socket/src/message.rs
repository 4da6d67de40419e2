use bytes::Bytes;

use crate::error::{Result, SocketError};
use crate::socket::Socket;
use crate::sync::Wait;

impl Socket {
    /// Send `frames` as one message: every frame but the last carries the
    /// *more* flag.
    ///
    /// Frames already queued with [`Flag::More`](zsock_frame::Flag::More)
    /// through [`send_frame`](Self::send_frame) lead the message.
    pub fn send_message<I>(&mut self, frames: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        self.ensure_can_send()?;
        let start = self.outgoing.len();
        self.outgoing
            .extend(frames.into_iter().map(|f| Bytes::copy_from_slice(f.as_ref())));
        if self.outgoing.len() == start {
            return Err(SocketError::EmptyMessage);
        }
        let frames = std::mem::take(&mut self.outgoing);
        self.dispatch(frames)
    }

    /// Receive one whole message, blocking until it is available.
    pub fn recv_message(&mut self) -> Result<Vec<Bytes>> {
        let wait = Wait::with_timeout(self.config().recv_timeout);
        self.next_message(wait)
    }

    /// Receive one whole message if its first frame is available right now;
    /// otherwise fail with `WouldBlock`.
    pub fn recv_message_nowait(&mut self) -> Result<Vec<Bytes>> {
        self.next_message(Wait::Poll)
    }

    /// Messages arrive whole, so once the first frame is here the rest is
    /// too. A message partly consumed with `recv_frame` yields its
    /// remaining frames.
    fn next_message(&mut self, wait: Wait) -> Result<Vec<Bytes>> {
        if self.pending.is_empty() {
            self.fill_pending(wait)?;
        }
        self.rcvmore = false;
        Ok(self.pending.drain(..).collect())
    }
}
