use crate::endpoint::{Endpoint, Scheme};
use crate::error::{Result, TransportError};
use crate::tcp::TcpTransport;
use crate::traits::TransportStream;
#[cfg(unix)]
use crate::uds::UnixDomainSocket;

/// A bound stream-transport listener for `ipc://` or `tcp://`.
pub enum Listener {
    #[cfg(unix)]
    Unix(UnixDomainSocket),
    Tcp(TcpTransport),
}

impl Listener {
    /// Bind a stream endpoint. `inproc://` is not a stream transport and is
    /// rejected here.
    pub fn bind(endpoint: &Endpoint) -> Result<Self> {
        match endpoint.scheme() {
            #[cfg(unix)]
            Scheme::Ipc => Ok(Listener::Unix(UnixDomainSocket::bind(endpoint.address())?)),
            Scheme::Tcp => Ok(Listener::Tcp(TcpTransport::bind(endpoint.address())?)),
            _ => Err(TransportError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "not a stream transport on this platform".to_string(),
            }),
        }
    }

    /// Accept the next connection (blocking).
    pub fn accept(&self) -> Result<TransportStream> {
        match self {
            #[cfg(unix)]
            Listener::Unix(listener) => listener.accept(),
            Listener::Tcp(listener) => listener.accept(),
        }
    }

    /// The endpoint actually bound, with any ephemeral port resolved.
    pub fn local_endpoint(&self) -> Endpoint {
        match self {
            #[cfg(unix)]
            Listener::Unix(listener) => {
                Endpoint::new(Scheme::Ipc, listener.path().display().to_string())
            }
            Listener::Tcp(listener) => Endpoint::new(Scheme::Tcp, listener.local_addr().to_string()),
        }
    }

    /// Returns a closure that unblocks a thread parked in [`accept`](Self::accept).
    pub fn waker(&self) -> Box<dyn Fn() + Send + Sync> {
        match self {
            #[cfg(unix)]
            Listener::Unix(listener) => {
                let path = listener.path().to_path_buf();
                Box::new(move || UnixDomainSocket::wake(&path))
            }
            Listener::Tcp(listener) => {
                let addr = listener.local_addr();
                Box::new(move || TcpTransport::wake(addr))
            }
        }
    }
}

/// Open a stream connection to `endpoint` (blocking, single attempt).
pub fn connect(endpoint: &Endpoint) -> Result<TransportStream> {
    match endpoint.scheme() {
        #[cfg(unix)]
        Scheme::Ipc => UnixDomainSocket::connect(endpoint.address()),
        Scheme::Tcp => TcpTransport::connect(endpoint.address()),
        _ => Err(TransportError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: "not a stream transport on this platform".to_string(),
        }),
    }
}
