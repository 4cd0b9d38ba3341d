//! Demo server - registers a handful of procedures and serves them.
//!
//! ```text
//! cargo run --example echo_server -- --listen 127.0.0.1:8080
//! cargo run --example call -- echo "Hello, RPC!"
//! cargo run --example call -- add 5 3
//! cargo run --example call -- getByID 42
//! ```
//!
//! Set `RUST_LOG=debug` for per-connection logging.

use std::collections::BTreeMap;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use wirecall::{Protocol, Server, Structured};

#[derive(Parser, Debug)]
#[command(name = "echo_server")]
#[command(about = "wirecall demo server")]
struct Args {
    /// Endpoint to listen on (`host:port` or `unix:/path`)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Speak the newline-delimited text protocol instead of frames
    #[arg(long)]
    line: bool,

    /// Close connections idle for this many seconds
    #[arg(long)]
    idle_secs: Option<u64>,

    /// Reject frames larger than this many bytes
    #[arg(long)]
    max_payload: Option<u64>,
}

#[derive(Serialize)]
struct User {
    id: i64,
    name: String,
    active: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let mut builder = Server::builder()
        .register("echo", |message: String| {
            let mut reply = BTreeMap::new();
            reply.insert("message".to_string(), message);
            reply
        })
        .register("add", |a: i64, b: i64| a + b)
        .register("divmod", |a: i64, b: i64| -> Result<(i64, i64), String> {
            if b == 0 {
                return Err("division by zero".to_string());
            }
            Ok((a / b, a % b))
        })
        .register("greet", |name: Option<String>| match name {
            Some(name) => format!("Hello, {}!", name),
            None => "Hello!".to_string(),
        })
        .register("getByID", |id: i64| {
            Structured(User {
                id,
                name: format!("user{}", id),
                active: id % 2 == 0,
            })
        })
        .register("data", || {
            serde_json::json!({
                "service": "wirecall",
                "limits": { "connections": null, "requests": [1, 10, 100] }
            })
        });

    if args.line {
        builder = builder.protocol(Protocol::Line);
    }
    if let Some(secs) = args.idle_secs {
        builder = builder.idle_timeout(Duration::from_secs(secs));
    }
    if let Some(limit) = args.max_payload {
        builder = builder.max_payload_size(limit);
    }

    let server = builder.bind(&args.listen).await?;
    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
