//! Byte-stream view of a socket.
//!
//! Each write becomes one message; each read delivers (part of) one
//! message. A message that does not fit the caller's buffer is returned in
//! pieces: the first read reports `BufferFull` and later reads drain the
//! retained remainder before anything new is received.

use std::io;

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{Result, SocketError};
use crate::socket::Socket;

impl Socket {
    /// Read the next message payload into `buf`.
    ///
    /// On ROUTER and STREAM sockets the leading identity frame is not part
    /// of the payload; it is remembered as the [last client
    /// id](Self::last_client_id). Frames of one message are concatenated.
    ///
    /// Returns the number of bytes written. When the payload is larger than
    /// `buf`, `buf` is filled, the rest is kept for the next call and
    /// `Err(BufferFull { written })` is returned.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.ensure_open()?;

        if !self.leftover.is_empty() {
            let written = copy_prefix(&self.leftover, buf);
            self.leftover.advance(written);
            if !self.leftover.is_empty() {
                return Err(SocketError::BufferFull { written });
            }
            return Ok(written);
        }

        let mut frames = self.recv_message()?;
        if self.pattern().is_address_aware() && !frames.is_empty() {
            self.last_client_id = frames.remove(0);
        }
        let payload = concat(frames);

        let written = copy_prefix(&payload, buf);
        if written < payload.len() {
            self.leftover = payload.slice(written..);
            return Err(SocketError::BufferFull { written });
        }
        Ok(written)
    }

    /// Send `buf` as a single-frame message, unsplit. On ROUTER and STREAM
    /// sockets the message is addressed to the [last client
    /// id](Self::last_client_id), which stays set for later writes.
    pub fn write_bytes(&mut self, buf: &[u8]) -> Result<usize> {
        if self.pattern().is_address_aware() {
            let identity = self.last_client_id.clone();
            self.send_message([&identity[..], buf])?;
        } else {
            self.send_message([buf])?;
        }
        Ok(buf.len())
    }
}

fn copy_prefix(src: &[u8], dst: &mut [u8]) -> usize {
    let n = src.len().min(dst.len());
    dst[..n].copy_from_slice(&src[..n]);
    n
}

fn concat(frames: Vec<Bytes>) -> Bytes {
    if frames.len() == 1 {
        return frames.into_iter().next().unwrap_or_default();
    }
    let total = frames.iter().map(Bytes::len).sum();
    let mut joined = BytesMut::with_capacity(total);
    for frame in frames {
        joined.extend_from_slice(&frame);
    }
    joined.freeze()
}

/// `BufferFull` becomes a short read; the remainder comes with the next
/// call. Empty messages are skipped, since a zero-length read would look
/// like end of stream.
impl io::Read for Socket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            match self.read_bytes(buf) {
                Ok(0) => continue,
                Ok(n) | Err(SocketError::BufferFull { written: n }) => return Ok(n),
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl io::Write for Socket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_joins_frames_in_order() {
        let joined = concat(vec![
            Bytes::from_static(b"Hello"),
            Bytes::new(),
            Bytes::from_static(b" World"),
        ]);
        assert_eq!(joined.as_ref(), b"Hello World");
        assert!(concat(Vec::new()).is_empty());
    }

    #[test]
    fn copy_prefix_is_bounded_by_both_sides() {
        let mut small = [0u8; 3];
        assert_eq!(copy_prefix(b"abcdef", &mut small), 3);
        assert_eq!(&small, b"abc");

        let mut large = [0u8; 8];
        assert_eq!(copy_prefix(b"ab", &mut large), 2);
        assert_eq!(&large[..2], b"ab");
    }
}
