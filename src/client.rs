//! Client for calling procedures on a wirecall server.
//!
//! A [`Client`] holds one connection and sends one request at a time.
//!
//! # Example
//!
//! ```ignore
//! use wirecall::Client;
//!
//! let mut client = Client::connect("127.0.0.1:8080").await?;
//!
//! assert_eq!(client.call("echo", &["hi"]).await?, "hi");
//! assert_eq!(client.call("add", &["5", "3"]).await?, "8");
//!
//! // Error records come back as plain text from `call`...
//! let raw = client.call("missing", &[]).await?;
//! assert_eq!(raw, r#"{"error":"Function Not Found"}"#);
//!
//! // ...and as `RpcError::Remote` from `call_checked`.
//! assert!(client.call_checked("missing", &[]).await.is_err());
//! ```

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::io::{AsyncWriteExt, BufReader};

use crate::error::{RpcError, Result};
use crate::protocol::{
    build_frame, format_request_line, read_frame, read_line, Protocol, ARG_SEPARATOR,
};
use crate::transport::{connect, BoxedConnection, Connection, Endpoint};

/// Client-side settings.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Wire encoding; must match the server's.
    pub protocol: Protocol,
    /// Largest accepted response payload in bytes.
    pub max_payload_size: Option<u64>,
}

/// A connection to a wirecall server.
pub struct Client {
    stream: BufReader<BoxedConnection>,
    config: ClientConfig,
}

impl Client {
    /// Connect with default settings. Accepts `host:port` or `unix:/path`.
    pub async fn connect(endpoint: &str) -> Result<Self> {
        Self::connect_with(endpoint, ClientConfig::default()).await
    }

    /// Connect with explicit settings.
    pub async fn connect_with(endpoint: &str, config: ClientConfig) -> Result<Self> {
        let endpoint: Endpoint = endpoint.parse()?;
        let conn = connect(&endpoint).await?;
        tracing::debug!("Connected to {}", endpoint);
        Ok(Self::from_connection(conn, config))
    }

    /// Wrap an already-open stream.
    pub fn from_connection(conn: impl Connection, config: ClientConfig) -> Self {
        let conn: BoxedConnection = Box::new(conn);
        Self {
            stream: BufReader::new(conn),
            config,
        }
    }

    /// Call a procedure and return the raw response text.
    ///
    /// Server-side failures arrive as an `{"error": ...}` record in the
    /// returned text; only transport problems are `Err`.
    pub async fn call(&mut self, procedure: &str, args: &[&str]) -> Result<String> {
        let response = match self.config.protocol {
            Protocol::Framed => self.call_framed(procedure, args).await?,
            Protocol::Line => self.call_line(procedure, args).await?,
        };
        tracing::debug!("{}({}) -> {} bytes", procedure, args.join("|"), response.len());
        Ok(response)
    }

    /// Call a procedure, turning an error record into [`RpcError::Remote`].
    pub async fn call_checked(&mut self, procedure: &str, args: &[&str]) -> Result<String> {
        let response = self.call(procedure, args).await?;
        match parse_error_record(&response) {
            Some(message) => Err(RpcError::Remote(message)),
            None => Ok(response),
        }
    }

    /// Call a procedure returning a structured value and deserialize it.
    pub async fn call_json<T>(&mut self, procedure: &str, args: &[&str]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.call_checked(procedure, args).await?;
        Ok(serde_json::from_str(&response)?)
    }

    /// Shut down the write side and drop the connection.
    pub async fn close(mut self) -> Result<()> {
        self.stream.get_mut().shutdown().await?;
        Ok(())
    }

    async fn call_framed(&mut self, procedure: &str, args: &[&str]) -> Result<String> {
        let mut request = build_frame(procedure.as_bytes());
        for arg in args {
            request.extend_from_slice(&build_frame(arg.as_bytes()));
        }
        let conn = self.stream.get_mut();
        conn.write_all(&request).await?;
        conn.flush().await?;

        let frame = read_frame(&mut self.stream, self.config.max_payload_size)
            .await?
            .ok_or(RpcError::ConnectionClosed)?;
        String::from_utf8(frame.into_payload().to_vec())
            .map_err(|e| RpcError::Protocol(format!("response is not valid UTF-8: {}", e)))
    }

    async fn call_line(&mut self, procedure: &str, args: &[&str]) -> Result<String> {
        check_line_request(procedure, args)?;

        let conn = self.stream.get_mut();
        conn.write_all(format_request_line(procedure, args).as_bytes())
            .await?;
        conn.flush().await?;

        read_line(&mut self.stream, self.config.max_payload_size)
            .await?
            .ok_or(RpcError::ConnectionClosed)
    }
}

/// Reject requests the server would parse differently from what was sent.
///
/// The server trims the whole line and treats an empty argument section as
/// zero arguments.
fn check_line_request(procedure: &str, args: &[&str]) -> Result<()> {
    let reject = |reason: &str| -> Result<()> {
        Err(RpcError::Protocol(format!("line protocol: {}", reason)))
    };

    if procedure.is_empty() || procedure.contains(char::is_whitespace) {
        return reject("procedure name must be non-empty without whitespace");
    }
    if args.iter().any(|a| a.contains([ARG_SEPARATOR, '\n', '\r'])) {
        return reject("arguments cannot contain '|' or line breaks");
    }
    if args.len() == 1 && args[0].is_empty() {
        return reject("a single empty argument reads as no arguments");
    }
    if args.last().is_some_and(|a| a.ends_with(char::is_whitespace)) {
        return reject("trailing whitespace on the last argument is trimmed");
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ErrorRecord {
    error: String,
}

/// Extract the message if `text` is exactly a single-key `{"error": ...}`
/// record.
///
/// ```
/// use wirecall::client::parse_error_record;
///
/// assert_eq!(
///     parse_error_record(r#"{"error":"Function Not Found"}"#).as_deref(),
///     Some("Function Not Found")
/// );
/// assert_eq!(parse_error_record("8"), None);
/// assert_eq!(parse_error_record(r#"{"error":"x","id":1}"#), None);
/// ```
pub fn parse_error_record(text: &str) -> Option<String> {
    serde_json::from_str::<ErrorRecord>(text)
        .ok()
        .map(|record| record.error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::CallRecord;
    use crate::{Dispatcher, ProcedureRegistry, ServerConfig};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn client_for(protocol: Protocol) -> Client {
        let mut registry = ProcedureRegistry::new();
        registry.register("echo", |data: String| data);
        registry.register("pair", |a: i64| (a, a * 10));
        registry.register("config", || {
            let mut map = BTreeMap::new();
            map.insert("retries".to_string(), 3i64);
            map
        });

        let (client, server) = tokio::io::duplex(64 * 1024);
        let config = ServerConfig {
            protocol,
            ..ServerConfig::default()
        };
        let dispatcher = Dispatcher::new(
            server,
            Arc::new(registry),
            Arc::new(|_: &CallRecord| {}),
            config,
            "duplex",
        );
        tokio::spawn(dispatcher.run());

        Client::from_connection(
            client,
            ClientConfig {
                protocol,
                ..ClientConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_call_framed() {
        let mut client = client_for(Protocol::Framed);
        assert_eq!(client.call("echo", &["a b\nc|d"]).await.unwrap(), "a b\nc|d");
        assert_eq!(client.call("pair", &["4"]).await.unwrap(), "4 40");
    }

    #[tokio::test]
    async fn test_call_line() {
        let mut client = client_for(Protocol::Line);
        assert_eq!(client.call("echo", &["hi"]).await.unwrap(), "hi");
        assert!(matches!(
            client.call("echo", &["a|b"]).await,
            Err(RpcError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_call_line_rejects_mangled_arguments() {
        let mut client = client_for(Protocol::Line);

        for args in [
            &[""][..],
            &["hi  "][..],
            &["a", "b\t"][..],
            &["a\rb"][..],
            &["x\r"][..],
        ] {
            assert!(
                matches!(client.call("echo", args).await, Err(RpcError::Protocol(_))),
                "accepted {:?}",
                args
            );
        }
        assert!(matches!(
            client.call("", &["x"]).await,
            Err(RpcError::Protocol(_))
        ));
        assert!(matches!(
            client.call("ec ho", &["x"]).await,
            Err(RpcError::Protocol(_))
        ));

        // Rejection happens before anything is written.
        assert_eq!(client.call("echo", &["ok"]).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_call_line_keeps_inner_whitespace() {
        let mut client = client_for(Protocol::Line);
        assert_eq!(client.call("echo", &["  hi"]).await.unwrap(), "  hi");
        assert_eq!(client.call("echo", &["a  b"]).await.unwrap(), "a  b");
    }

    #[tokio::test]
    async fn test_call_checked_remote_error() {
        let mut client = client_for(Protocol::Framed);
        match client.call_checked("missing", &[]).await {
            Err(RpcError::Remote(message)) => assert_eq!(message, "Function Not Found"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(client.call_checked("echo", &["ok"]).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_call_json() {
        let mut client = client_for(Protocol::Framed);
        let config: BTreeMap<String, i64> = client.call_json("config", &[]).await.unwrap();
        assert_eq!(config.get("retries"), Some(&3));
    }

    #[tokio::test]
    async fn test_closed_connection() {
        let (client, server) = tokio::io::duplex(1024);
        drop(server);
        let mut client = Client::from_connection(client, ClientConfig::default());

        let err = client.call("echo", &["hi"]).await.unwrap_err();
        assert!(err.is_framing());
    }

    #[test]
    fn test_parse_error_record_requires_single_key() {
        assert_eq!(parse_error_record(r#"{"error":"boom"}"#).as_deref(), Some("boom"));
        assert_eq!(parse_error_record(r#"{"error":1}"#), None);
        assert_eq!(parse_error_record("hello"), None);
        assert_eq!(parse_error_record(""), None);
    }
}
