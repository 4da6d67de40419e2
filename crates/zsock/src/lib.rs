//! Pattern sockets with multipart messages.
//!
//! zsock provides PUSH/PULL, PUB/SUB, REQ/REP, ROUTER/DEALER, XPUB/XSUB,
//! PAIR and STREAM sockets over `inproc://`, `ipc://` and `tcp://`
//! endpoints, with frame and message primitives, peer identity tracking
//! and a byte-stream adapter.
//!
//! # Crate Structure
//!
//! - [`transport`]: endpoint grammar and stream transports (UDS, TCP)
//! - [`frame`]: frames, the *more* flag and the wire codec
//! - [`socket`]: sockets, patterns and the per-pattern constructors
//!
//! The socket API is also re-exported at the crate root.
//!
//! ```no_run
//! let mut rep = zsock::new_rep("tcp://127.0.0.1:5555")?;
//! let request = rep.recv_message()?;
//! rep.send_message(request)?;
//! # Ok::<(), zsock::SocketError>(())
//! ```

/// Re-export transport types.
pub mod transport {
    pub use zsock_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use zsock_frame::*;
}

/// Re-export socket types.
pub mod socket {
    pub use zsock_socket::*;
}

pub use zsock_socket::*;
