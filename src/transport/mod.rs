//! Transport module - stream sockets.
//!
//! Provides abstraction over:
//! - TCP (all platforms)
//! - Unix Domain Sockets (Linux/macOS)

mod socket;

pub use socket::{connect, BoxedConnection, Connection, Endpoint, Listener, UNIX_PREFIX};
