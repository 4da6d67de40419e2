use bytes::Bytes;
use tracing::trace;
use zsock_frame::{Flag, Frame};

use crate::error::{Result, SocketError};
use crate::pattern::Pattern;
use crate::socket::Socket;
use crate::sync::Wait;

impl Socket {
    /// Send one frame. With [`Flag::More`] the frame is held until the
    /// frame that ends the message arrives, so peers only ever see whole
    /// messages.
    ///
    /// Zero-length frames are valid.
    pub fn send_frame(&mut self, data: &[u8], flag: Flag) -> Result<()> {
        self.ensure_can_send()?;
        self.outgoing.push(Bytes::copy_from_slice(data));
        if flag.is_more() {
            return Ok(());
        }
        let frames = std::mem::take(&mut self.outgoing);
        self.dispatch(frames)
    }

    /// Receive the next frame, blocking until one is available (or the
    /// configured receive timeout passes).
    pub fn recv_frame(&mut self) -> Result<Frame> {
        let wait = Wait::with_timeout(self.config().recv_timeout);
        self.next_frame(wait)
    }

    /// Receive the next frame if one is available right now; otherwise fail
    /// with `WouldBlock` and reset [`rcvmore`](Self::rcvmore).
    pub fn recv_frame_nowait(&mut self) -> Result<Frame> {
        self.next_frame(Wait::Poll)
    }

    fn next_frame(&mut self, wait: Wait) -> Result<Frame> {
        if self.pending.is_empty() {
            self.fill_pending(wait)?;
        }
        let data = self.pending.pop_front().ok_or(SocketError::WouldBlock)?;
        self.rcvmore = !self.pending.is_empty();
        Ok(Frame::new(data, Flag::from_more(self.rcvmore)))
    }

    /// Pull the next whole message from the socket into `pending`.
    pub(crate) fn fill_pending(&mut self, wait: Wait) -> Result<()> {
        self.ensure_can_recv()?;
        let result = self.accept_message(wait);
        if result.is_err() {
            self.rcvmore = false;
        }
        result
    }

    fn accept_message(&mut self, wait: Wait) -> Result<()> {
        loop {
            let delivery = self.core.recv(wait)?;
            match self.pattern() {
                Pattern::Req if self.reply_pipe != Some(delivery.pipe) => {
                    trace!(pipe = delivery.pipe, "dropping reply from unexpected peer");
                    continue;
                }
                Pattern::Rep => self.reply_pipe = Some(delivery.pipe),
                _ => {}
            }
            self.pending.extend(delivery.frames);
            return Ok(());
        }
    }

    /// Route a finished outbound message.
    pub(crate) fn dispatch(&mut self, frames: Vec<Bytes>) -> Result<()> {
        let wait = Wait::with_timeout(self.config().send_timeout);
        let routed = self.core.route(frames, wait, self.reply_pipe)?;
        if self.pattern() == Pattern::Req {
            self.reply_pipe = routed;
        }
        Ok(())
    }

    pub(crate) fn ensure_can_send(&self) -> Result<()> {
        self.ensure_open()?;
        if !self.pattern().can_send() {
            return Err(SocketError::Unsupported {
                pattern: self.pattern(),
                operation: "send",
            });
        }
        Ok(())
    }

    pub(crate) fn ensure_can_recv(&self) -> Result<()> {
        self.ensure_open()?;
        if !self.pattern().can_recv() {
            return Err(SocketError::Unsupported {
                pattern: self.pattern(),
                operation: "receive",
            });
        }
        Ok(())
    }
}
