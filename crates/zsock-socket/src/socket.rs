use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};

use bytes::Bytes;
use tracing::{debug, warn};
use zsock_transport::{split_endpoints, Direction, Endpoint, EndpointSpec, Scheme};

use crate::config::SocketConfig;
use crate::connector;
use crate::engine::Core;
use crate::error::{Result, SocketError};
use crate::inproc;
use crate::listener;
use crate::pattern::Pattern;
use crate::pipe::PipeId;
use crate::subscription::Subscription;

/// A messaging socket of one fixed [`Pattern`].
///
/// A socket is meant to be driven from one thread at a time. Use
/// [`closer`](Self::closer) to shut it down from elsewhere.
pub struct Socket {
    pub(crate) core: Arc<Core>,
    /// Frames of the message currently being received.
    pub(crate) pending: VecDeque<Bytes>,
    /// Frames sent with `Flag::More` that wait for the last frame.
    pub(crate) outgoing: Vec<Bytes>,
    pub(crate) rcvmore: bool,
    /// Undelivered tail of the last message read through the stream adapter.
    pub(crate) leftover: Bytes,
    pub(crate) last_client_id: Bytes,
    /// REP: where the next reply goes. REQ: the only peer a reply is
    /// accepted from.
    pub(crate) reply_pipe: Option<PipeId>,
    endpoints: Vec<String>,
    destroyed: bool,
}

impl Socket {
    /// Create an unattached socket with default configuration.
    pub fn new(pattern: Pattern) -> Self {
        Self::from_core(Core::new(pattern, SocketConfig::default()))
    }

    /// Create an unattached socket with explicit configuration.
    pub fn with_config(pattern: Pattern, config: SocketConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_core(Core::new(pattern, config)))
    }

    fn from_core(core: Arc<Core>) -> Self {
        Self {
            core,
            pending: VecDeque::new(),
            outgoing: Vec::new(),
            rcvmore: false,
            leftover: Bytes::new(),
            last_client_id: Bytes::new(),
            reply_pipe: None,
            endpoints: Vec::new(),
            destroyed: false,
        }
    }

    pub fn pattern(&self) -> Pattern {
        self.core.pattern()
    }

    pub fn config(&self) -> &SocketConfig {
        self.core.config()
    }

    /// Bind one endpoint. Returns the endpoint actually bound, with an
    /// ephemeral TCP port (`tcp://host:*`) resolved.
    pub fn bind(&mut self, endpoint: &str) -> Result<String> {
        self.ensure_open()?;
        let parsed =
            Endpoint::parse(endpoint).map_err(|err| SocketError::from_endpoint(endpoint, err))?;

        let resolved = match parsed.scheme() {
            Scheme::Inproc => {
                inproc::bind(&self.core, parsed.address())?;
                parsed
            }
            Scheme::Ipc | Scheme::Tcp => listener::bind(&self.core, &parsed)?,
        };

        let resolved = resolved.to_string();
        self.endpoints.push(resolved.clone());
        Ok(resolved)
    }

    /// Connect to one endpoint.
    ///
    /// Inproc connections complete immediately (or when the name is bound);
    /// ipc/tcp connections are made and remade in the background.
    pub fn connect(&mut self, endpoint: &str) -> Result<()> {
        self.ensure_open()?;
        let parsed =
            Endpoint::parse(endpoint).map_err(|err| SocketError::from_endpoint(endpoint, err))?;

        match parsed.scheme() {
            Scheme::Inproc => inproc::connect(&self.core, parsed.address())?,
            Scheme::Ipc | Scheme::Tcp => {
                debug!(endpoint, pattern = %self.pattern(), "connecting");
                let resolved = parsed.to_string();
                connector::connect(&self.core, parsed)?;
                self.endpoints.push(resolved);
                return Ok(());
            }
        }
        self.endpoints.push(parsed.to_string());
        Ok(())
    }

    /// Bind or connect every address in a comma-separated list. Entries
    /// without a `@`/`>` sigil bind when `serverish` is set and connect
    /// otherwise.
    ///
    /// Every entry is attempted. If any fails, one `InvalidEndpoint` naming
    /// the whole list is returned and the entries that succeeded stay
    /// attached.
    pub fn attach(&mut self, endpoints: &str, serverish: bool) -> Result<()> {
        let default = if serverish {
            Direction::Bind
        } else {
            Direction::Connect
        };
        self.attach_with(endpoints, Some(default))
    }

    pub(crate) fn attach_with(&mut self, endpoints: &str, default: Option<Direction>) -> Result<()> {
        self.ensure_open()?;
        let entries = split_endpoints(endpoints);
        if entries.is_empty() {
            return Err(SocketError::invalid_endpoint(endpoints, "no endpoints given"));
        }

        let mut failed = 0usize;
        for entry in &entries {
            if let Err(err) = self.attach_one(entry, default) {
                warn!(endpoint = *entry, pattern = %self.pattern(), error = %err, "attach failed");
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(SocketError::invalid_endpoint(
                endpoints,
                format!("{failed} of {} endpoint(s) failed to attach", entries.len()),
            ));
        }
        Ok(())
    }

    fn attach_one(&mut self, entry: &str, default: Option<Direction>) -> Result<()> {
        let spec = EndpointSpec::parse(entry).map_err(|err| SocketError::from_endpoint(entry, err))?;
        let endpoint = spec.endpoint.to_string();
        match spec.direction_or(default) {
            Some(Direction::Bind) => self.bind(&endpoint).map(|_| ()),
            Some(Direction::Connect) => self.connect(&endpoint),
            None => Err(SocketError::invalid_endpoint(
                entry,
                format!("{} sockets need an explicit '@' or '>'", self.pattern()),
            )),
        }
    }

    /// True when a frame can be received without blocking.
    pub fn pollin(&self) -> bool {
        !self.is_destroyed() && (!self.pending.is_empty() || self.core.is_readable())
    }

    /// True when a message can be sent without blocking.
    pub fn pollout(&self) -> bool {
        !self.is_destroyed() && self.core.is_writable()
    }

    /// The *more* flag of the last frame received. Reset to false when a
    /// receive fails.
    pub fn rcvmore(&self) -> bool {
        self.rcvmore
    }

    /// Subscribe to messages whose first frame starts with `topic`. An
    /// empty topic matches everything. SUB and XSUB only.
    pub fn subscribe(&mut self, topic: &[u8]) -> Result<()> {
        self.ensure_subscriber("subscribe")?;
        self.core
            .change_subscription(Subscription::Subscribe(Bytes::copy_from_slice(topic)));
        Ok(())
    }

    /// Cancel one earlier [`subscribe`](Self::subscribe) of `topic`.
    pub fn unsubscribe(&mut self, topic: &[u8]) -> Result<()> {
        self.ensure_subscriber("unsubscribe")?;
        self.core
            .change_subscription(Subscription::Cancel(Bytes::copy_from_slice(topic)));
        Ok(())
    }

    fn ensure_subscriber(&self, operation: &'static str) -> Result<()> {
        self.ensure_open()?;
        if !self.pattern().is_subscriber() {
            return Err(SocketError::Unsupported {
                pattern: self.pattern(),
                operation,
            });
        }
        Ok(())
    }

    /// Endpoints bound or connected so far, in the order they were attached.
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Number of peers currently connected.
    pub fn peer_count(&self) -> usize {
        self.core.peer_count()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed || self.core.is_closed()
    }

    /// Close the socket and release its endpoints, peers and buffers.
    /// Calling it again does nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.core.shutdown();
        self.pending.clear();
        self.outgoing.clear();
        self.leftover = Bytes::new();
        self.rcvmore = false;
        debug!(pattern = %self.pattern(), "socket destroyed");
    }

    /// A handle that can close this socket from another thread.
    pub fn closer(&self) -> SocketCloser {
        SocketCloser {
            core: Arc::downgrade(&self.core),
        }
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_destroyed() {
            return Err(SocketError::Closed);
        }
        Ok(())
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket")
            .field("pattern", &self.pattern())
            .field("endpoints", &self.endpoints)
            .field("leftover", &self.leftover.len())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

/// Closes a [`Socket`] from another thread.
///
/// Calls blocked on the socket fail with [`SocketError::Closed`].
#[derive(Clone)]
pub struct SocketCloser {
    core: Weak<Core>,
}

impl SocketCloser {
    pub fn close(&self) {
        if let Some(core) = self.core.upgrade() {
            core.shutdown();
        }
    }
}

impl fmt::Debug for SocketCloser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketCloser")
            .field("alive", &(self.core.strong_count() > 0))
            .finish()
    }
}
