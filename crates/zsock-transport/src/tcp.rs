use std::net::{SocketAddr, TcpListener, TcpStream};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::TransportStream;

/// TCP listener backing `tcp://` endpoints.
pub struct TcpTransport {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpTransport {
    /// Bind to `host:port`. A host of `*` means all interfaces and a port of
    /// `*` asks the OS for an ephemeral port.
    pub fn bind(address: &str) -> Result<Self> {
        let resolved = bind_address(address);
        let listener = TcpListener::bind(&resolved).map_err(|e| TransportError::Bind {
            endpoint: format!("tcp://{address}"),
            source: e,
        })?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "listening on tcp");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<TransportStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted tcp connection");
        Ok(TransportStream::from_tcp(stream))
    }

    /// Connect to a listening TCP endpoint (blocking).
    pub fn connect(address: &str) -> Result<TransportStream> {
        let stream = TcpStream::connect(address).map_err(|e| TransportError::Connect {
            endpoint: format!("tcp://{address}"),
            source: e,
        })?;
        debug!(address, "connected to tcp endpoint");
        Ok(TransportStream::from_tcp(stream))
    }

    /// Unblock a thread parked in [`accept`](Self::accept).
    pub fn wake(addr: SocketAddr) {
        let target = if addr.ip().is_unspecified() {
            match addr {
                SocketAddr::V4(_) => SocketAddr::from(([127, 0, 0, 1], addr.port())),
                SocketAddr::V6(_) => SocketAddr::from(([0, 0, 0, 0, 0, 0, 0, 1], addr.port())),
            }
        } else {
            addr
        };
        let _ = TcpStream::connect(target);
    }

    /// The address actually bound (ephemeral port resolved).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

fn bind_address(address: &str) -> String {
    let (host, port) = address.rsplit_once(':').unwrap_or((address, "0"));
    let host = if host == "*" { "0.0.0.0" } else { host };
    let port = if port == "*" { "0" } else { port };
    format!("{host}:{port}")
}
