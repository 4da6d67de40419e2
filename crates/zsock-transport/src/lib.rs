//! Endpoint parsing and byte-stream transports.
//!
//! This is the lowest layer of zsock. It knows nothing about frames or
//! socket patterns; it only turns endpoint strings into bound listeners and
//! connected [`TransportStream`]s:
//! - `ipc://path`: Unix domain sockets (Linux/macOS)
//! - `tcp://host:port`: TCP
//!
//! `inproc://` endpoints are parsed here but served by the socket engine
//! itself, since they never touch the OS.

pub mod endpoint;
pub mod error;
pub mod listener;
pub mod tcp;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use endpoint::{split_endpoints, Direction, Endpoint, EndpointSpec, Scheme};
pub use error::{Result, TransportError};
pub use listener::{connect, Listener};
pub use tcp::TcpTransport;
pub use traits::TransportStream;

#[cfg(unix)]
pub use uds::UnixDomainSocket;
