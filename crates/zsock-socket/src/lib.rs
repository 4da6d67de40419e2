//! Pattern sockets over inproc, ipc and tcp.
//!
//! A [`Socket`] has one fixed [`Pattern`] (PUSH, ROUTER, PUB, ...) and
//! exchanges whole multipart messages with its peers. On top of the
//! frame and message primitives it offers:
//! - peer identity tracking for ROUTER and STREAM sockets
//! - a byte-stream adapter (`read_bytes`/`write_bytes`, plus
//!   [`std::io::Read`] and [`std::io::Write`])
//! - one constructor per pattern that binds or connects a comma-separated
//!   endpoint list, honoring `@` (bind) and `>` (connect) sigils
//!
//! ```no_run
//! use zsock_socket::{new_pull, new_push, Flag};
//!
//! let mut pull = new_pull("inproc://jobs")?;
//! let mut push = new_push("inproc://jobs")?;
//! push.send_frame(b"hello", Flag::None)?;
//! assert_eq!(pull.recv_frame()?.data().as_ref(), b"hello");
//! # Ok::<(), zsock_socket::SocketError>(())
//! ```

pub mod config;
pub mod constructors;
pub mod error;
pub mod greeting;
pub mod pattern;
pub mod socket;
pub mod subscription;

mod connector;
mod engine;
mod frame;
mod identity;
mod inproc;
mod listener;
mod mailbox;
mod message;
mod pipe;
mod session;
mod stream;
mod sync;

pub use config::{SocketConfig, MAX_IDENTITY_LEN};
pub use constructors::{
    new_dealer, new_pair, new_pub, new_pull, new_push, new_rep, new_req, new_router, new_stream,
    new_sub, new_xpub, new_xsub, AttachError, AttachResult,
};
pub use error::{Result, SocketError};
pub use greeting::{Greeting, PROTOCOL_NAME, PROTOCOL_VERSION};
pub use pattern::{Pattern, UnknownPattern};
pub use socket::{Socket, SocketCloser};
pub use subscription::Subscription;
pub use zsock_frame::{Flag, Frame};
