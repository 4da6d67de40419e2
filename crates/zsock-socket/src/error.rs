use std::io;

use zsock_frame::FrameError;
use zsock_transport::TransportError;

use crate::pattern::Pattern;

/// Errors that can occur in socket operations.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    /// Malformed or unreachable endpoint at bind, connect or construction.
    ///
    /// For compound endpoints this names the whole string, not the entry
    /// that failed.
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// A non-blocking call (or one whose timeout expired) found nothing to do.
    #[error("operation would block")]
    WouldBlock,

    /// The read buffer was smaller than the message payload. `written` bytes
    /// were delivered; the rest is kept for the next read.
    #[error("buffer full ({written} bytes delivered, remainder retained)")]
    BufferFull { written: usize },

    /// The socket has been destroyed.
    #[error("socket closed")]
    Closed,

    /// The pattern cannot perform this operation.
    #[error("{pattern} sockets do not support {operation}")]
    Unsupported {
        pattern: Pattern,
        operation: &'static str,
    },

    /// The peer's pattern cannot talk to ours.
    #[error("incompatible peer: {local} cannot talk to {remote}")]
    IncompatiblePattern { local: Pattern, remote: Pattern },

    /// A message must contain at least one frame.
    #[error("message must contain at least one frame")]
    EmptyMessage,

    /// The call is not valid in the socket's current state.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Rejected socket configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Greeting exchange with a stream peer failed.
    #[error("greeting failed: {0}")]
    Greeting(String),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SocketError {
    pub(crate) fn invalid_endpoint(endpoint: &str, reason: impl Into<String>) -> Self {
        SocketError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }

    /// Map transport errors raised while resolving an endpoint into the
    /// endpoint error kind callers match on.
    pub(crate) fn from_endpoint(endpoint: &str, err: TransportError) -> Self {
        match err {
            TransportError::InvalidEndpoint { reason, .. } => {
                SocketError::invalid_endpoint(endpoint, reason)
            }
            TransportError::PathTooLong { len, max, .. } => SocketError::invalid_endpoint(
                endpoint,
                format!("path too long ({len} bytes, max {max})"),
            ),
            TransportError::Bind { source, .. } | TransportError::Connect { source, .. } => {
                SocketError::invalid_endpoint(endpoint, source.to_string())
            }
            other => SocketError::Transport(other),
        }
    }
}

impl From<SocketError> for io::Error {
    fn from(err: SocketError) -> Self {
        let kind = match &err {
            SocketError::WouldBlock => io::ErrorKind::WouldBlock,
            SocketError::Closed => io::ErrorKind::BrokenPipe,
            SocketError::InvalidEndpoint { .. }
            | SocketError::InvalidConfig(_)
            | SocketError::EmptyMessage => io::ErrorKind::InvalidInput,
            SocketError::Unsupported { .. } => io::ErrorKind::Unsupported,
            SocketError::Frame(FrameError::Io(io)) => io.kind(),
            SocketError::Transport(TransportError::Io(io)) => io.kind(),
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

pub type Result<T> = std::result::Result<T, SocketError>;
