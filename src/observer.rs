//! Per-request latency/outcome records.
//!
//! The dispatcher hands one [`CallRecord`] per request to a [`CallObserver`].
//! The default [`LogObserver`] writes it to `tracing`; plug in your own to
//! feed metrics.

use std::time::Duration;

/// How a request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// A result payload was written.
    Success,
    /// An error record was written; carries the error text.
    Failure(String),
}

impl CallOutcome {
    /// Check if the request succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success)
    }
}

/// One processed request.
#[derive(Debug, Clone)]
pub struct CallRecord {
    /// Remote peer of the connection.
    pub peer: String,
    /// Requested procedure name (possibly unregistered).
    pub procedure: String,
    /// Raw argument tokens, lossily decoded as UTF-8.
    pub args: Vec<String>,
    /// Time from the complete request to the written response.
    pub elapsed: Duration,
    /// Result of the request.
    pub outcome: CallOutcome,
}

/// Sink for per-request records.
pub trait CallObserver: Send + Sync + 'static {
    /// Receive one record. Called on the connection's task after the
    /// response is written; keep it cheap.
    fn record(&self, record: &CallRecord);
}

impl<F> CallObserver for F
where
    F: Fn(&CallRecord) + Send + Sync + 'static,
{
    fn record(&self, record: &CallRecord) {
        self(record)
    }
}

/// Writes one `tracing` line per request.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl CallObserver for LogObserver {
    fn record(&self, record: &CallRecord) {
        let elapsed = format!("{:?}", record.elapsed);
        let args = record.args.join("|");
        match &record.outcome {
            CallOutcome::Success => {
                tracing::info!("{:<15} | {:<28} | {}", elapsed, record.procedure, args)
            }
            CallOutcome::Failure(error) => tracing::info!(
                "{:<15} | {:<28} | {} | error: {}",
                elapsed,
                record.procedure,
                args,
                error
            ),
        }
    }
}
