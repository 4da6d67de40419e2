//! Frames and the multipart wire codec.
//!
//! A [`Frame`] is one delimited byte sequence plus a *more* flag; a message
//! is an ordered run of frames where only the last one clears *more*. On
//! stream transports every frame is written with:
//! - A 2-byte magic number ("ZF") for stream synchronization
//! - A 1-byte flags field (MORE, COMMAND)
//! - A 4-byte little-endian payload length

pub mod codec;
pub mod error;
pub mod flags;
pub mod reader;
pub mod writer;

pub use codec::{decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE};
pub use error::{FrameError, Result};
pub use flags::{Flag, COMMAND, MORE};
pub use reader::FrameReader;
pub use writer::FrameWriter;
