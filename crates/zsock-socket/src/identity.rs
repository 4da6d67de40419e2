use bytes::Bytes;

use crate::socket::Socket;

impl Socket {
    /// Identity of the peer that sent the last message read through the
    /// stream adapter on a ROUTER or STREAM socket. Empty until one has
    /// been read or set.
    pub fn last_client_id(&self) -> Bytes {
        self.last_client_id.clone()
    }

    /// Direct the next [`write_bytes`](Self::write_bytes) to the peer with
    /// this identity, typically one remembered from an earlier read.
    pub fn set_last_client_id(&mut self, id: &[u8]) {
        self.last_client_id = Bytes::copy_from_slice(id);
    }
}
