//! # wirecall
//!
//! Minimal RPC over length-prefixed frames.
//!
//! Plain Rust functions are registered under a name; their parameter types
//! are read at compile time and drive how textual arguments from the wire are
//! coerced. Each accepted connection is served by its own task, one request
//! at a time.
//!
//! ## Wire format
//!
//! - **Frame**: 8-byte big-endian length + payload
//! - **Request**: one frame with the procedure name, then one frame per
//!   argument
//! - **Response**: one frame holding the result text, a JSON document for
//!   structured results, or `{"error": "..."}`
//!
//! ## Example
//!
//! ```ignore
//! use wirecall::{Client, Server};
//!
//! #[tokio::main]
//! async fn main() -> wirecall::Result<()> {
//!     let server = Server::builder()
//!         .register("echo", |data: String| data)
//!         .register("add", |a: i64, b: i64| a + b)
//!         .bind("127.0.0.1:8080")
//!         .await?;
//!     tokio::spawn(server.run());
//!
//!     let mut client = Client::connect("127.0.0.1:8080").await?;
//!     assert_eq!(client.call("add", &["5", "3"]).await?, "8");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod codec;
pub mod dispatcher;
pub mod error;
pub mod observer;
pub mod procedure;
pub mod protocol;
pub mod server;
pub mod transport;

pub use client::{parse_error_record, Client, ClientConfig};
pub use codec::{Output, Value};
pub use dispatcher::Dispatcher;
pub use error::{Result, RpcError};
pub use observer::{CallObserver, CallOutcome, CallRecord, LogObserver};
pub use procedure::{ProcedureRegistry, Structured};
pub use protocol::{Frame, Protocol};
pub use server::{Server, ServerBuilder, ServerConfig};
