use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::flags::{self, Flag, COMMAND, MORE};

/// Frame header: magic (2) + flags (1) + length (4) = 7 bytes.
pub const HEADER_SIZE: usize = 7;

/// Magic bytes: "ZF" (0x5A 0x46).
pub const MAGIC: [u8; 2] = [0x5A, 0x46];

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// One delimited byte sequence plus its continuation flag.
///
/// Zero-length frames are valid and distinct from "no frame".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    flags: u8,
    data: Bytes,
}

impl Frame {
    /// Create a data frame.
    pub fn new(data: impl Into<Bytes>, flag: Flag) -> Self {
        Self {
            flags: flag.bits(),
            data: data.into(),
        }
    }

    /// Create a connection-level command frame.
    pub fn command(data: impl Into<Bytes>) -> Self {
        Self {
            flags: COMMAND,
            data: data.into(),
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn into_data(self) -> Bytes {
        self.data
    }

    /// Whether another frame of the same message follows.
    pub fn more(&self) -> bool {
        self.flags & MORE != 0
    }

    pub fn flag(&self) -> Flag {
        Flag::from_more(self.more())
    }

    pub fn is_command(&self) -> bool {
        self.flags & COMMAND != 0
    }

    /// Raw flags byte as carried on the wire.
    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.data.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────┬───────────┬─────────────────┐
/// │ Magic (2B)   │ Flags    │ Length    │ Payload         │
/// │ 0x5A 0x46    │ (1B)     │ (4B LE)   │ (Length bytes)  │
/// │ "ZF"         │          │           │                 │
/// └──────────────┴──────────┴───────────┴─────────────────┘
/// ```
pub fn encode_frame(flags: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if !flags::is_valid(flags) {
        return Err(FrameError::InvalidFlags(flags));
    }
    if payload.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u8(flags);
    dst.put_u32_le(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    if src[0..2] != MAGIC {
        return Err(FrameError::InvalidMagic);
    }

    let flags = src[2];
    if !flags::is_valid(flags) {
        return Err(FrameError::InvalidFlags(flags));
    }

    let payload_len = u32::from_le_bytes([src[3], src[4], src[5], src[6]]) as usize;
    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let data = src.split_to(payload_len).freeze();

    Ok(Some(Frame { flags, data }))
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
