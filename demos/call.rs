//! Demo client - calls one procedure and prints the response.
//!
//! ```text
//! cargo run --example call -- add 5 3
//! cargo run --example call -- --endpoint unix:/tmp/wirecall.sock echo hi
//! ```

use clap::Parser;
use tracing_subscriber::EnvFilter;
use wirecall::{Client, ClientConfig, Protocol};

#[derive(Parser, Debug)]
#[command(name = "call")]
#[command(about = "Call a procedure on a wirecall server")]
struct Args {
    /// Server endpoint (`host:port` or `unix:/path`)
    #[arg(short, long, default_value = "localhost:8080")]
    endpoint: String,

    /// Speak the newline-delimited text protocol instead of frames
    #[arg(long)]
    line: bool,

    /// Procedure name
    procedure: String,

    /// Arguments, sent as text
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args = Args::parse();
    let config = ClientConfig {
        protocol: if args.line {
            Protocol::Line
        } else {
            Protocol::Framed
        },
        ..ClientConfig::default()
    };

    let mut client = Client::connect_with(&args.endpoint, config).await?;
    let call_args: Vec<&str> = args.args.iter().map(String::as_str).collect();

    match client.call_checked(&args.procedure, &call_args).await {
        Ok(result) => println!("{}", result),
        Err(e) => {
            eprintln!("{} failed: {}", args.procedure, e);
            std::process::exit(1);
        }
    }

    client.close().await?;
    Ok(())
}
