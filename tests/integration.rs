//! Integration tests for wirecall.
//!
//! These tests run a real server on an ephemeral port and talk to it through
//! the public client.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use wirecall::protocol::{build_frame, read_frame};
use wirecall::{
    CallRecord, Client, ClientConfig, Protocol, RpcError, Server, ServerBuilder, Structured,
};

#[derive(Debug, serde::Serialize, Deserialize, PartialEq)]
struct User {
    id: i64,
    name: String,
    roles: Vec<String>,
}

fn builder() -> ServerBuilder {
    Server::builder()
        .register("echo", |data: String| data)
        .register("add", |a: String, b: String| -> Result<i64, String> {
            let a: i64 = a.parse().map_err(|_| format!("not a number: {}", a))?;
            let b: i64 = b.parse().map_err(|_| format!("not a number: {}", b))?;
            Ok(a + b)
        })
        .register("data", || {
            let mut inner = BTreeMap::new();
            inner.insert("depth".to_string(), serde_json::json!(2));
            inner.insert("tags".to_string(), serde_json::json!(["a", "b"]));
            let mut outer = BTreeMap::new();
            outer.insert("name".to_string(), serde_json::json!("root"));
            outer.insert("inner".to_string(), serde_json::to_value(inner).unwrap_or_default());
            outer
        })
        .register("getByID", |id: i64| {
            Structured(User {
                id,
                name: format!("user{}", id),
                roles: vec!["reader".to_string()],
            })
        })
        .register("greet", |name: Option<String>| match name {
            Some(name) => format!("hello {}", name),
            None => "hello nobody".to_string(),
        })
        .register("reset", || ())
        .observer(|_: &CallRecord| {})
}

async fn start(builder: ServerBuilder) -> String {
    let server = builder.bind("127.0.0.1:0").await.unwrap();
    let endpoint = server.local_endpoint().unwrap().to_string();
    tokio::spawn(server.run());
    endpoint
}

/// Text in, same text out.
#[tokio::test]
async fn test_echo() {
    let endpoint = start(builder()).await;
    let mut client = Client::connect(&endpoint).await.unwrap();

    assert_eq!(client.call("echo", &["hi"]).await.unwrap(), "hi");
}

/// Text arguments parsed by the procedure itself.
#[tokio::test]
async fn test_add() {
    let endpoint = start(builder()).await;
    let mut client = Client::connect(&endpoint).await.unwrap();

    assert_eq!(client.call("add", &["5", "3"]).await.unwrap(), "8");

    let failure = client.call("add", &["five", "3"]).await.unwrap();
    assert_eq!(
        wirecall::parse_error_record(&failure).as_deref(),
        Some("invocation failed: not a number: five")
    );
}

/// A nested record parses back to the value that was returned.
#[tokio::test]
async fn test_structured_record() {
    let endpoint = start(builder()).await;
    let mut client = Client::connect(&endpoint).await.unwrap();

    let parsed: serde_json::Value = client.call_json("data", &[]).await.unwrap();
    assert_eq!(
        parsed,
        serde_json::json!({
            "name": "root",
            "inner": { "depth": 2, "tags": ["a", "b"] }
        })
    );
}

/// Unknown procedure, then the connection still works.
#[tokio::test]
async fn test_missing_then_echo() {
    let endpoint = start(builder()).await;
    let mut client = Client::connect(&endpoint).await.unwrap();

    assert_eq!(
        client.call("missing", &[]).await.unwrap(),
        r#"{"error":"Function Not Found"}"#
    );
    assert_eq!(client.call("echo", &["hi"]).await.unwrap(), "hi");
}

/// Integer coercion failure, then a valid call.
#[tokio::test]
async fn test_get_by_id() {
    let endpoint = start(builder()).await;
    let mut client = Client::connect(&endpoint).await.unwrap();

    match client.call_checked("getByID", &["abc"]).await {
        Err(RpcError::Remote(message)) => assert!(message.contains("position 0")),
        other => panic!("unexpected result: {:?}", other),
    }

    let user: User = client.call_json("getByID", &["12"]).await.unwrap();
    assert_eq!(
        user,
        User {
            id: 12,
            name: "user12".to_string(),
            roles: vec!["reader".to_string()],
        }
    );
}

#[tokio::test]
async fn test_optional_text_sentinel() {
    let endpoint = start(builder()).await;
    let mut client = Client::connect(&endpoint).await.unwrap();

    for _ in 0..3 {
        assert_eq!(client.call("greet", &["null"]).await.unwrap(), "hello nobody");
        assert_eq!(client.call("greet", &["ada"]).await.unwrap(), "hello ada");
    }
}

#[tokio::test]
async fn test_zero_results_empty_frame() {
    let endpoint = start(builder()).await;
    let mut stream = TcpStream::connect(&endpoint).await.unwrap();

    stream.write_all(&build_frame(b"reset")).await.unwrap();
    let frame = read_frame(&mut stream, None).await.unwrap().unwrap();
    assert!(frame.is_empty());
}

#[tokio::test]
async fn test_truncated_request_closes_connection() {
    let endpoint = start(builder()).await;
    let mut stream = TcpStream::connect(&endpoint).await.unwrap();

    // Declares 100 bytes, sends 3.
    let mut request = build_frame(b"echo");
    request.extend_from_slice(&100u64.to_be_bytes());
    request.extend_from_slice(b"abc");
    stream.write_all(&request).await.unwrap();
    stream.shutdown().await.unwrap();

    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
}

#[tokio::test]
async fn test_line_protocol_arity() {
    let endpoint = start(builder().protocol(Protocol::Line)).await;
    let config = ClientConfig {
        protocol: Protocol::Line,
        ..ClientConfig::default()
    };
    let mut client = Client::connect_with(&endpoint, config).await.unwrap();

    assert_eq!(client.call("add", &["5", "3"]).await.unwrap(), "8");
    match client.call_checked("add", &["5"]).await {
        Err(RpcError::Remote(message)) => {
            assert!(message.contains("incorrect number of arguments"))
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(client.call("echo", &["still ok"]).await.unwrap(), "still ok");
}

#[tokio::test]
async fn test_concurrent_clients() {
    let endpoint = start(builder()).await;

    let mut handles = Vec::new();
    for i in 0..8i64 {
        let endpoint = endpoint.clone();
        handles.push(tokio::spawn(async move {
            let mut client = Client::connect(&endpoint).await.unwrap();
            for j in 0..20i64 {
                let (a, b) = (i.to_string(), j.to_string());
                let sum = client.call("add", &[a.as_str(), b.as_str()]).await.unwrap();
                assert_eq!(sum, (i + j).to_string());
            }
            client.close().await.unwrap();
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn test_observer_records() {
    let records = Arc::new(Mutex::new(Vec::new()));
    let sink = records.clone();
    let endpoint = start(
        builder().observer(move |r: &CallRecord| sink.lock().unwrap().push(r.clone())),
    )
    .await;

    let mut client = Client::connect(&endpoint).await.unwrap();
    client.call("echo", &["x"]).await.unwrap();
    client.call("missing", &[]).await.unwrap();
    // Records land after the response is written; one more round trip
    // guarantees the first two are in.
    client.call("echo", &["sync"]).await.unwrap();

    let records = records.lock().unwrap();
    let names: Vec<_> = records.iter().take(2).map(|r| r.procedure.as_str()).collect();
    assert_eq!(names, vec!["echo", "missing"]);
    assert!(records[0].outcome.is_success());
    assert!(!records[1].outcome.is_success());
}

#[cfg(unix)]
#[tokio::test]
async fn test_unix_socket() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = format!("unix:{}", dir.path().join("wirecall.sock").display());

    let server = builder().bind(&endpoint).await.unwrap();
    tokio::spawn(server.run());

    let mut client = Client::connect(&endpoint).await.unwrap();
    assert_eq!(client.call("echo", &["over uds"]).await.unwrap(), "over uds");
}
