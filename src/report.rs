//! Failure reporting
//!
//! Every recoverable failure is reported once, at the point it
//! happens, as a structured [`Failure`] to the [`FailureSink`] the
//! session was built with. Fail-soft operations have no other channel.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::error;

/// The lifecycle step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AcquireStore,
    Connect,
    ResolveFolder,
    CheckExists,
    CreateFolder,
    OpenFolder,
    FetchAll,
    FetchMatching,
    Expunge,
    SetFlags,
    CloseFolder,
    CloseStore,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AcquireStore => "acquire_store",
            Self::Connect => "connect",
            Self::ResolveFolder => "resolve_folder",
            Self::CheckExists => "check_exists",
            Self::CreateFolder => "create_folder",
            Self::OpenFolder => "open_folder",
            Self::FetchAll => "fetch_all",
            Self::FetchMatching => "fetch_matching",
            Self::Expunge => "expunge",
            Self::SetFlags => "set_flags",
            Self::CloseFolder => "close_folder",
            Self::CloseStore => "close_store",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub operation: Operation,
    /// Protocol, host or folder path the operation targeted.
    pub target: String,
    pub cause: String,
}

impl Failure {
    pub fn new(operation: Operation, target: impl Into<String>, cause: &dyn fmt::Display) -> Self {
        Self {
            operation,
            target: target.into(),
            cause: cause.to_string(),
        }
    }
}

/// Receives failure records.
pub trait FailureSink: Send + Sync + fmt::Debug {
    fn record(&self, failure: Failure);
}

/// Emits each failure as a `tracing` error event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn record(&self, failure: Failure) {
        error!(
            operation = %failure.operation,
            target = %failure.target,
            cause = %failure.cause,
            "Mail operation failed"
        );
    }
}

/// Keeps failures in memory, for assertions and for callers that
/// want to summarize failures after a run.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    failures: Arc<Mutex<Vec<Failure>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn failures(&self) -> Vec<Failure> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Operations recorded so far, in order.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.failures().iter().map(|f| f.operation).collect()
    }
}

impl FailureSink for MemorySink {
    fn record(&self, failure: Failure) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(failure);
    }
}

/// Shared handle to a sink.
pub type SharedSink = Arc<dyn FailureSink>;
