//! One constructor per pattern. Each creates a socket and binds or connects
//! every entry of a comma-separated endpoint list, using the pattern's
//! default role unless an entry starts with `@` (bind) or `>` (connect).
//!
//! PAIR and STREAM have no default role, so their entries need a sigil.
//!
//! If any entry fails the constructor returns an [`AttachError`]. Entries
//! that did attach stay attached: the error hands back the socket so the
//! caller can keep using it or [`destroy`](Socket::destroy) it. Converting
//! the error into a [`SocketError`] (for example with `?`) drops the socket
//! and with it every attached endpoint.

use crate::error::SocketError;
use crate::pattern::Pattern;
use crate::socket::Socket;

/// A constructor that could not attach every endpoint.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct AttachError {
    /// Why attaching failed; `InvalidEndpoint` for endpoint-list failures.
    pub error: SocketError,
    /// The socket with whatever endpoints did attach.
    pub socket: Socket,
}

impl AttachError {
    /// Split into the error and the partly attached socket.
    pub fn into_parts(self) -> (SocketError, Socket) {
        (self.error, self.socket)
    }
}

impl From<AttachError> for SocketError {
    fn from(err: AttachError) -> Self {
        err.error
    }
}

/// Result of a pattern constructor.
pub type AttachResult = std::result::Result<Socket, AttachError>;

fn attach(mut socket: Socket, endpoints: &str) -> AttachResult {
    let default = socket.pattern().default_direction();
    match socket.attach_with(endpoints, default) {
        Ok(()) => Ok(socket),
        Err(error) => Err(AttachError { error, socket }),
    }
}

fn build(pattern: Pattern, endpoints: &str) -> AttachResult {
    attach(Socket::new(pattern), endpoints)
}

/// PUSH socket, binds by default.
pub fn new_push(endpoints: &str) -> AttachResult {
    build(Pattern::Push, endpoints)
}

/// PULL socket, connects by default.
pub fn new_pull(endpoints: &str) -> AttachResult {
    build(Pattern::Pull, endpoints)
}

/// PUB socket, binds by default.
pub fn new_pub(endpoints: &str) -> AttachResult {
    build(Pattern::Pub, endpoints)
}

/// SUB socket, connects by default. `topics` is a comma-separated list of
/// prefixes to subscribe to; an empty string subscribes to everything.
pub fn new_sub(endpoints: &str, topics: &str) -> AttachResult {
    let mut socket = Socket::new(Pattern::Sub);
    for topic in topics.split(',') {
        if let Err(error) = socket.subscribe(topic.as_bytes()) {
            return Err(AttachError { error, socket });
        }
    }
    attach(socket, endpoints)
}

/// REQ socket, connects by default.
pub fn new_req(endpoints: &str) -> AttachResult {
    build(Pattern::Req, endpoints)
}

/// REP socket, binds by default.
pub fn new_rep(endpoints: &str) -> AttachResult {
    build(Pattern::Rep, endpoints)
}

/// ROUTER socket, binds by default.
pub fn new_router(endpoints: &str) -> AttachResult {
    build(Pattern::Router, endpoints)
}

/// DEALER socket, connects by default.
pub fn new_dealer(endpoints: &str) -> AttachResult {
    build(Pattern::Dealer, endpoints)
}

/// XPUB socket, binds by default.
pub fn new_xpub(endpoints: &str) -> AttachResult {
    build(Pattern::XPub, endpoints)
}

/// XSUB socket, connects by default.
pub fn new_xsub(endpoints: &str) -> AttachResult {
    build(Pattern::XSub, endpoints)
}

/// PAIR socket. Every endpoint needs a `@` or `>` sigil.
pub fn new_pair(endpoints: &str) -> AttachResult {
    build(Pattern::Pair, endpoints)
}

/// STREAM socket. Every endpoint needs a `@` or `>` sigil.
pub fn new_stream(endpoints: &str) -> AttachResult {
    build(Pattern::Stream, endpoints)
}
