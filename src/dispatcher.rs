//! Per-connection request loop.
//!
//! A [`Dispatcher`] owns one connection and serves its requests strictly one
//! at a time:
//!
//! ```text
//! AwaitingProcedureName -> AwaitingArguments -> Dispatching -> AwaitingProcedureName
//!            \________________________\______________\______-> Closed
//! ```
//!
//! Request-level failures (unknown procedure, bad arguments, a failing
//! callable) are answered with an `{"error": ...}` record and the loop keeps
//! going. Framing-level failures end the connection.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

use crate::codec::ResultCodec;
use crate::error::{RpcError, Result};
use crate::observer::{CallObserver, CallOutcome, CallRecord};
use crate::procedure::{ProcedureEntry, ProcedureRegistry};
use crate::protocol::{
    parse_request_line, read_frame, read_line, read_required_frame, write_frame, write_line,
    Protocol,
};
use crate::server::ServerConfig;

/// Where the dispatcher is within the current request.
#[derive(Debug)]
enum DispatchState {
    AwaitingProcedureName,
    AwaitingArguments {
        entry: Arc<ProcedureEntry>,
    },
    Dispatching {
        entry: Arc<ProcedureEntry>,
        tokens: Vec<Bytes>,
    },
    Closed,
}

/// Serves requests on a single connection.
pub struct Dispatcher<S> {
    stream: BufReader<S>,
    registry: Arc<ProcedureRegistry>,
    observer: Arc<dyn CallObserver>,
    config: ServerConfig,
    peer: String,
}

impl<S> Dispatcher<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Create a dispatcher for one connection.
    pub fn new(
        stream: S,
        registry: Arc<ProcedureRegistry>,
        observer: Arc<dyn CallObserver>,
        config: ServerConfig,
        peer: impl Into<String>,
    ) -> Self {
        Self {
            stream: BufReader::new(stream),
            registry,
            observer,
            config,
            peer: peer.into(),
        }
    }

    /// Serve until the peer disconnects or the stream breaks.
    ///
    /// A clean close between requests returns `Ok(())`; anything else
    /// returns the framing error that ended the connection.
    pub async fn run(mut self) -> Result<()> {
        tracing::debug!("Connection from {} opened", self.peer);

        let mut state = DispatchState::AwaitingProcedureName;
        let result = loop {
            let step = match state {
                DispatchState::AwaitingProcedureName => self.await_procedure_name().await,
                DispatchState::AwaitingArguments { entry } => self.await_arguments(entry).await,
                DispatchState::Dispatching { entry, tokens } => self.dispatch(entry, tokens).await,
                DispatchState::Closed => break Ok(()),
            };
            match step {
                Ok(next) => state = next,
                Err(e) => break Err(e),
            }
        };

        match &result {
            Ok(()) => tracing::debug!("Connection from {} closed", self.peer),
            Err(e) => tracing::error!("Connection from {} terminated: {}", self.peer, e),
        }
        result
    }

    async fn await_procedure_name(&mut self) -> Result<DispatchState> {
        match self.config.protocol {
            Protocol::Framed => {
                let frame = with_deadline(
                    self.config.idle_timeout,
                    read_frame(&mut self.stream, self.config.max_payload_size),
                )
                .await?;
                let Some(frame) = frame else {
                    return Ok(DispatchState::Closed);
                };

                let name = String::from_utf8_lossy(frame.payload()).into_owned();
                match self.registry.lookup(&name) {
                    Some(entry) => Ok(DispatchState::AwaitingArguments {
                        entry: Arc::clone(entry),
                    }),
                    None => {
                        // Any argument frames the client sent are read as the
                        // next procedure names.
                        let err = RpcError::ProcedureNotFound(name.clone());
                        self.reject(name, Vec::new(), err).await?;
                        Ok(DispatchState::AwaitingProcedureName)
                    }
                }
            }
            Protocol::Line => {
                let line = with_deadline(
                    self.config.idle_timeout,
                    read_line(&mut self.stream, self.config.max_payload_size),
                )
                .await?;
                let Some(line) = line else {
                    return Ok(DispatchState::Closed);
                };

                let request = match parse_request_line(&line) {
                    Ok(request) => request,
                    Err(e) => {
                        self.reject(String::new(), vec![line], e).await?;
                        return Ok(DispatchState::AwaitingProcedureName);
                    }
                };

                match self.registry.lookup(&request.procedure) {
                    Some(entry) => Ok(DispatchState::Dispatching {
                        entry: Arc::clone(entry),
                        tokens: request.args.into_iter().map(Bytes::from).collect(),
                    }),
                    None => {
                        let err = RpcError::ProcedureNotFound(request.procedure.clone());
                        self.reject(request.procedure, request.args, err).await?;
                        Ok(DispatchState::AwaitingProcedureName)
                    }
                }
            }
        }
    }

    async fn await_arguments(&mut self, entry: Arc<ProcedureEntry>) -> Result<DispatchState> {
        let count = entry.descriptor().param_count();
        let mut tokens = Vec::with_capacity(count);
        for _ in 0..count {
            let frame = with_deadline(
                self.config.idle_timeout,
                read_required_frame(&mut self.stream, self.config.max_payload_size),
            )
            .await?;
            tokens.push(frame.into_payload());
        }
        Ok(DispatchState::Dispatching { entry, tokens })
    }

    async fn dispatch(&mut self, entry: Arc<ProcedureEntry>, tokens: Vec<Bytes>) -> Result<DispatchState> {
        let started = Instant::now();
        let args: Vec<String> = tokens
            .iter()
            .map(|t| String::from_utf8_lossy(t).into_owned())
            .collect();
        let procedure = entry.name().to_string();

        let (payload, outcome) = match execute(entry, tokens).await {
            Ok(payload) => (payload, CallOutcome::Success),
            Err(e) => {
                tracing::warn!("Procedure {} failed: {}", procedure, e);
                (Bytes::from(e.to_response()), CallOutcome::Failure(e.to_string()))
            }
        };

        self.write_response(&payload).await?;
        self.observer.record(&CallRecord {
            peer: self.peer.clone(),
            procedure,
            args,
            elapsed: started.elapsed(),
            outcome,
        });
        Ok(DispatchState::AwaitingProcedureName)
    }

    /// Answer a request that never reached a procedure.
    async fn reject(&mut self, procedure: String, args: Vec<String>, error: RpcError) -> Result<()> {
        let started = Instant::now();
        tracing::warn!("Rejected request for {:?} from {}: {}", procedure, self.peer, error);

        self.write_response(&error.to_response()).await?;
        self.observer.record(&CallRecord {
            peer: self.peer.clone(),
            procedure,
            args,
            elapsed: started.elapsed(),
            outcome: CallOutcome::Failure(error.to_string()),
        });
        Ok(())
    }

    async fn write_response(&mut self, payload: &[u8]) -> Result<()> {
        match self.config.protocol {
            Protocol::Framed => write_frame(&mut self.stream, payload).await,
            Protocol::Line => write_line(&mut self.stream, payload).await,
        }
    }
}

/// Coerce, invoke on the blocking pool, serialize.
async fn execute(entry: Arc<ProcedureEntry>, tokens: Vec<Bytes>) -> Result<Bytes> {
    let args = entry.coerce(&tokens)?;
    let output = tokio::task::spawn_blocking(move || entry.invoke(args))
        .await
        .map_err(|e| {
            if e.is_panic() {
                RpcError::Invocation("procedure panicked".to_string())
            } else {
                RpcError::Invocation(e.to_string())
            }
        })??;
    ResultCodec::encode(&output)
}

async fn with_deadline<T, F>(deadline: Option<Duration>, read: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, read)
            .await
            .map_err(|_| RpcError::Timeout(limit))?,
        None => read.await,
    }
}
