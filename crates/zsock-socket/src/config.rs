use std::time::Duration;

use bytes::Bytes;
use zsock_frame::{FrameConfig, DEFAULT_MAX_PAYLOAD};

use crate::error::{Result, SocketError};

/// Longest explicit identity a socket may announce.
pub const MAX_IDENTITY_LEN: usize = 255;

/// Per-socket behavior knobs.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// Identity announced to address-aware peers. When unset (or already
    /// taken on the peer) the peer generates one.
    pub identity: Option<Bytes>,
    /// Inbound queue capacity, in messages.
    pub recv_hwm: usize,
    /// Blocking receives fail with `WouldBlock` after this long.
    pub recv_timeout: Option<Duration>,
    /// Blocking sends fail with `WouldBlock` after this long.
    pub send_timeout: Option<Duration>,
    /// Delay between stream-transport connection attempts.
    pub reconnect_interval: Duration,
    /// How long a stream peer may take to complete the greeting.
    pub greeting_timeout: Duration,
    /// Largest frame accepted from or written to a stream peer.
    pub max_frame_size: usize,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            identity: None,
            recv_hwm: 1000,
            recv_timeout: None,
            send_timeout: None,
            reconnect_interval: Duration::from_millis(100),
            greeting_timeout: Duration::from_secs(5),
            max_frame_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

impl SocketConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(identity) = &self.identity {
            if identity.is_empty() || identity.len() > MAX_IDENTITY_LEN {
                return Err(SocketError::InvalidConfig(format!(
                    "identity must be 1..={MAX_IDENTITY_LEN} bytes, got {}",
                    identity.len()
                )));
            }
        }
        if self.recv_hwm == 0 {
            return Err(SocketError::InvalidConfig(
                "recv_hwm must be at least 1".to_string(),
            ));
        }
        if self.max_frame_size == 0 {
            return Err(SocketError::InvalidConfig(
                "max_frame_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Codec settings for traffic after the greeting.
    pub(crate) fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_payload_size: self.max_frame_size,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
