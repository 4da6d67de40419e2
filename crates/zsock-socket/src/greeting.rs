use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use zsock_frame::{FrameError, FrameReader, FrameWriter};

use crate::config::MAX_IDENTITY_LEN;
use crate::error::{Result, SocketError};
use crate::pattern::Pattern;

/// Protocol name carried in every greeting.
pub const PROTOCOL_NAME: &str = "zsock";
/// Local protocol version. Peers must share the major version.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Upper bound on a greeting frame, applied before the peer is trusted.
pub(crate) const MAX_GREETING_PAYLOAD: usize = 16 * 1024;

const MAX_PROTOCOL_LEN: usize = 32;
const MAX_VERSION_LEN: usize = 16;

/// First command frame each side of a stream connection sends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Greeting {
    pub protocol: String,
    pub version: String,
    pub pattern: Pattern,
    /// Identity the sender would like to be addressed by.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Vec<u8>>,
}

impl Greeting {
    pub fn new(pattern: Pattern, identity: Option<&Bytes>) -> Self {
        Self {
            protocol: PROTOCOL_NAME.to_string(),
            version: PROTOCOL_VERSION.to_string(),
            pattern,
            identity: identity.map(|id| id.to_vec()),
        }
    }

    pub(crate) fn identity_bytes(&self) -> Option<Bytes> {
        self.identity.clone().map(Bytes::from)
    }
}

/// Send our greeting and wait for the peer's, then check that the two sides
/// can talk.
///
/// Both sides send first, so the exchange is symmetric and the same code runs
/// for accepted and outgoing connections.
pub(crate) fn exchange<R: Read, W: Write>(
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
    local: &Greeting,
    timeout: Duration,
) -> Result<Greeting> {
    let payload = serde_json::to_vec(local)?;
    writer.send_command(&payload)?;

    let deadline = Instant::now() + timeout;
    let payload = recv_greeting_payload(reader, deadline, timeout)?;
    let remote: Greeting = serde_json::from_slice(&payload)?;
    validate(&remote)?;

    if !local.pattern.is_compatible(remote.pattern) {
        return Err(SocketError::IncompatiblePattern {
            local: local.pattern,
            remote: remote.pattern,
        });
    }
    Ok(remote)
}

fn recv_greeting_payload<R: Read>(
    reader: &mut FrameReader<R>,
    deadline: Instant,
    timeout: Duration,
) -> Result<Bytes> {
    loop {
        if Instant::now() >= deadline {
            return Err(SocketError::Greeting(format!(
                "peer did not greet within {timeout:?}"
            )));
        }

        match reader.read_frame() {
            Ok(frame) => {
                if !frame.is_command() {
                    return Err(SocketError::Greeting(
                        "expected a greeting command frame, got data".to_string(),
                    ));
                }
                return Ok(frame.into_data());
            }
            Err(FrameError::Io(err))
                if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(FrameError::ConnectionClosed) => {
                return Err(SocketError::Greeting(
                    "connection closed during greeting".to_string(),
                ));
            }
            Err(err) => return Err(SocketError::Frame(err)),
        }
    }
}

fn validate(greeting: &Greeting) -> Result<()> {
    if greeting.protocol.is_empty() || greeting.protocol.len() > MAX_PROTOCOL_LEN {
        return Err(SocketError::Greeting(format!(
            "invalid protocol name length: {}",
            greeting.protocol.len()
        )));
    }
    if greeting.protocol != PROTOCOL_NAME {
        return Err(SocketError::Greeting(format!(
            "unknown protocol '{}' (expected '{PROTOCOL_NAME}')",
            greeting.protocol
        )));
    }
    if greeting.version.is_empty() || greeting.version.len() > MAX_VERSION_LEN {
        return Err(SocketError::Greeting(format!(
            "invalid protocol version length: {}",
            greeting.version.len()
        )));
    }
    if !is_version_compatible(&greeting.version, PROTOCOL_VERSION)? {
        return Err(SocketError::Greeting(format!(
            "incompatible version '{}' (local '{PROTOCOL_VERSION}')",
            greeting.version
        )));
    }
    if let Some(identity) = &greeting.identity {
        if identity.is_empty() || identity.len() > MAX_IDENTITY_LEN {
            return Err(SocketError::Greeting(format!(
                "invalid identity length: {}",
                identity.len()
            )));
        }
    }
    Ok(())
}

fn is_version_compatible(remote: &str, local: &str) -> Result<bool> {
    let (remote_major, _) = parse_version(remote)?;
    let (local_major, _) = parse_version(local)?;
    Ok(remote_major == local_major)
}

fn parse_version(version: &str) -> Result<(u16, u16)> {
    let invalid = |what: &str| SocketError::Greeting(format!("invalid version '{version}': {what}"));

    let (major, minor) = version
        .split_once('.')
        .ok_or_else(|| invalid("expected '<major>.<minor>'"))?;
    if minor.contains('.') {
        return Err(invalid("expected '<major>.<minor>'"));
    }

    let major = major.parse::<u16>().map_err(|_| invalid("non-numeric major"))?;
    let minor = minor.parse::<u16>().map_err(|_| invalid("non-numeric minor"))?;
    Ok((major, minor))
}
