//! Stream sockets: TCP everywhere, Unix domain sockets on Unix.
//!
//! # Example
//!
//! ```ignore
//! use wirecall::transport::{Endpoint, Listener};
//!
//! let endpoint: Endpoint = "127.0.0.1:8080".parse()?;
//! let listener = Listener::bind(&endpoint).await?;
//! let (conn, peer) = listener.accept().await?;
//! ```

use std::fmt;
use std::str::FromStr;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};

use crate::error::Result;

/// Prefix selecting a Unix domain socket endpoint.
pub const UNIX_PREFIX: &str = "unix:";

/// Any bidirectional byte stream a dispatcher or client can run on.
pub trait Connection: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> Connection for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// Type-erased connection.
pub type BoxedConnection = Box<dyn Connection>;

/// Where to listen or connect.
///
/// Parsed from `host:port` (TCP) or `unix:/path/to.sock`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// TCP address, resolved on bind/connect.
    Tcp(String),
    /// Unix domain socket path.
    #[cfg(unix)]
    Unix(std::path::PathBuf),
}

impl FromStr for Endpoint {
    type Err = crate::error::RpcError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(path) = s.strip_prefix(UNIX_PREFIX) {
            #[cfg(unix)]
            {
                return Ok(Endpoint::Unix(path.into()));
            }
            #[cfg(not(unix))]
            {
                return Err(crate::error::RpcError::Protocol(format!(
                    "Unix sockets are not available on this platform: {}",
                    path
                )));
            }
        }
        Ok(Endpoint::Tcp(s.to_string()))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp(addr) => f.write_str(addr),
            #[cfg(unix)]
            Endpoint::Unix(path) => write!(f, "{}{}", UNIX_PREFIX, path.display()),
        }
    }
}

/// Listening socket.
pub enum Listener {
    /// TCP listener.
    Tcp(TcpListener),
    /// Unix domain socket listener; the socket file is removed on drop.
    #[cfg(unix)]
    Unix {
        listener: tokio::net::UnixListener,
        path: std::path::PathBuf,
    },
}

impl Listener {
    /// Bind to an endpoint.
    ///
    /// For Unix sockets, removes any existing socket file at the path first.
    pub async fn bind(endpoint: &Endpoint) -> Result<Self> {
        match endpoint {
            Endpoint::Tcp(addr) => Ok(Listener::Tcp(TcpListener::bind(addr.as_str()).await?)),
            #[cfg(unix)]
            Endpoint::Unix(path) => {
                if path.exists() {
                    std::fs::remove_file(path)?;
                }
                let listener = tokio::net::UnixListener::bind(path)?;
                Ok(Listener::Unix {
                    listener,
                    path: path.clone(),
                })
            }
        }
    }

    /// Accept one connection. Returns the stream and a printable peer name.
    pub async fn accept(&self) -> Result<(BoxedConnection, String)> {
        match self {
            Listener::Tcp(listener) => {
                let (stream, addr) = listener.accept().await?;
                stream.set_nodelay(true)?;
                Ok((Box::new(stream), addr.to_string()))
            }
            #[cfg(unix)]
            Listener::Unix { listener, path } => {
                let (stream, _addr) = listener.accept().await?;
                Ok((Box::new(stream), path.display().to_string()))
            }
        }
    }

    /// The endpoint actually bound (resolves port 0 for TCP).
    pub fn local_endpoint(&self) -> Result<Endpoint> {
        match self {
            Listener::Tcp(listener) => Ok(Endpoint::Tcp(listener.local_addr()?.to_string())),
            #[cfg(unix)]
            Listener::Unix { path, .. } => Ok(Endpoint::Unix(path.clone())),
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Listener::Unix { path, .. } = self {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Open a client connection to an endpoint.
pub async fn connect(endpoint: &Endpoint) -> Result<BoxedConnection> {
    match endpoint {
        Endpoint::Tcp(addr) => {
            let stream = TcpStream::connect(addr.as_str()).await?;
            stream.set_nodelay(true)?;
            Ok(Box::new(stream))
        }
        #[cfg(unix)]
        Endpoint::Unix(path) => Ok(Box::new(tokio::net::UnixStream::connect(path).await?)),
    }
}
