//! Server builder and accept loop.
//!
//! The [`ServerBuilder`] collects procedures and settings; [`Server::run`]
//! accepts connections and hands each one to its own [`Dispatcher`] task.
//!
//! # Example
//!
//! ```ignore
//! use wirecall::Server;
//!
//! #[tokio::main]
//! async fn main() -> wirecall::Result<()> {
//!     let server = Server::builder()
//!         .register("echo", |data: String| data)
//!         .register("add", |a: i64, b: i64| a + b)
//!         .bind("127.0.0.1:8080")
//!         .await?;
//!
//!     server.run().await
//! }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::observer::{CallObserver, LogObserver};
use crate::procedure::{IntoProcedure, ProcedureRegistry};
use crate::protocol::Protocol;
use crate::transport::{Endpoint, Listener};

/// Default wire encoding.
pub const DEFAULT_PROTOCOL: Protocol = Protocol::Framed;

/// Default frame size limit (none).
pub const DEFAULT_MAX_PAYLOAD_SIZE: Option<u64> = None;

/// Default idle deadline (none).
pub const DEFAULT_IDLE_TIMEOUT: Option<Duration> = None;

/// Pause after a failed accept before trying again.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Per-connection settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Wire encoding spoken on every connection.
    pub protocol: Protocol,
    /// Largest accepted frame payload (or request line) in bytes.
    pub max_payload_size: Option<u64>,
    /// Longest wait for the next frame before the connection is closed.
    pub idle_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            protocol: DEFAULT_PROTOCOL,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// Builder for configuring and binding a server.
pub struct ServerBuilder {
    registry: ProcedureRegistry,
    config: ServerConfig,
    observer: Arc<dyn CallObserver>,
}

impl ServerBuilder {
    /// Create a new server builder.
    pub fn new() -> Self {
        Self {
            registry: ProcedureRegistry::new(),
            config: ServerConfig::default(),
            observer: Arc::new(LogObserver),
        }
    }

    /// Register a procedure under `name`.
    ///
    /// See [`ProcedureRegistry::register`].
    pub fn register<F, Args>(mut self, name: &str, procedure: F) -> Self
    where
        F: IntoProcedure<Args>,
    {
        self.registry.register(name, procedure);
        self
    }

    /// Use a pre-filled registry, replacing anything registered so far.
    pub fn registry(mut self, registry: ProcedureRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the wire encoding.
    ///
    /// Default: [`Protocol::Framed`]
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.config.protocol = protocol;
        self
    }

    /// Reject frames (or request lines) longer than `limit` bytes.
    ///
    /// An oversized frame closes the connection. Default: unlimited
    pub fn max_payload_size(mut self, limit: u64) -> Self {
        self.config.max_payload_size = Some(limit);
        self
    }

    /// Close connections that send nothing for `timeout`.
    ///
    /// Default: no deadline
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = Some(timeout);
        self
    }

    /// Replace the per-request record sink.
    ///
    /// Default: [`LogObserver`]
    pub fn observer(mut self, observer: impl CallObserver) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Bind the listener. Accepts `host:port` or `unix:/path`.
    pub async fn bind(self, endpoint: &str) -> Result<Server> {
        let endpoint: Endpoint = endpoint.parse()?;
        let listener = Listener::bind(&endpoint).await?;

        Ok(Server {
            listener,
            registry: Arc::new(self.registry),
            config: self.config,
            observer: self.observer,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound server, ready to accept connections.
///
/// The registry is frozen at bind time and shared read-only by every
/// connection.
pub struct Server {
    listener: Listener,
    registry: Arc<ProcedureRegistry>,
    config: ServerConfig,
    observer: Arc<dyn CallObserver>,
}

impl Server {
    /// Create a new server builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// The endpoint actually bound (resolves port 0).
    pub fn local_endpoint(&self) -> Result<Endpoint> {
        self.listener.local_endpoint()
    }

    /// Registered procedures.
    pub fn registry(&self) -> &ProcedureRegistry {
        &self.registry
    }

    /// Accept connections forever.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Accept connections until `shutdown` completes.
    ///
    /// Connections already accepted keep running on their own tasks.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.log_procedures();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Server shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((conn, peer)) => self.spawn_connection(conn, peer),
                    Err(e) => {
                        tracing::error!("Accept failed: {}", e);
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
            }
        }
    }

    fn spawn_connection(&self, conn: crate::transport::BoxedConnection, peer: String) {
        let dispatcher = Dispatcher::new(
            conn,
            self.registry.clone(),
            self.observer.clone(),
            self.config.clone(),
            peer,
        );
        tokio::spawn(async move {
            // Errors are already logged by the dispatcher.
            let _ = dispatcher.run().await;
        });
    }

    fn log_procedures(&self) {
        tracing::info!("Registered procedures:");
        for entry in self.registry.entries() {
            tracing::info!("[PROC] {:<30} | [Args] {}", entry.name(), entry.descriptor());
        }
        match self.local_endpoint() {
            Ok(endpoint) => tracing::info!("Listening on {}", endpoint),
            Err(e) => tracing::warn!("Listening on unknown address: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.protocol, DEFAULT_PROTOCOL);
        assert_eq!(config.max_payload_size, DEFAULT_MAX_PAYLOAD_SIZE);
        assert_eq!(config.idle_timeout, DEFAULT_IDLE_TIMEOUT);
    }

    #[test]
    fn test_builder_settings() {
        let builder = Server::builder()
            .protocol(Protocol::Line)
            .max_payload_size(4096)
            .idle_timeout(Duration::from_secs(30))
            .register("ping", || "pong");

        assert_eq!(builder.config.protocol, Protocol::Line);
        assert_eq!(builder.config.max_payload_size, Some(4096));
        assert_eq!(builder.config.idle_timeout, Some(Duration::from_secs(30)));
        assert!(builder.registry.contains("ping"));
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let server = Server::builder()
            .register("ping", || "pong")
            .bind("127.0.0.1:0")
            .await
            .unwrap();

        assert_eq!(server.registry().len(), 1);
        assert!(!server.local_endpoint().unwrap().to_string().ends_with(":0"));
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let server = Server::builder().bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(server.run_until(async move {
            let _ = rx.await;
        }));
        tx.send(()).unwrap();

        assert!(handle.await.unwrap().is_ok());
    }
}
