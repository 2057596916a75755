//! Harness Errors
//!
//! Run-level failures (`HarnessError`) are returned to the caller and stop the
//! run. Iteration-level failures (`IterationFailure`) never stop the run; they
//! are collected into the outcome with the operation's own error value.

use lanebench_stats::StatsError;
use std::any::Any;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failures of the harness itself
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Lane or iteration count rejected before any lane started
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The lane thread pool could not be created
    #[error("Failed to build lane pool: {0}")]
    WorkerPool(String),

    /// The bounded barrier wait expired
    #[error("Timed out after {elapsed:?}: {completed_lanes}/{lanes} lanes finished")]
    Timeout {
        /// Time waited before giving up
        elapsed: Duration,
        /// Lanes that reported before the deadline
        completed_lanes: usize,
        /// Lanes in the run
        lanes: usize,
    },

    /// A lane went away without reporting its samples
    #[error("Lane terminated without reporting: {0}")]
    LaneLost(String),

    /// The finished table could not be aggregated
    #[error("Aggregation failed: {0}")]
    Aggregation(#[from] StatsError),
}

/// How an operation failed
#[derive(Debug)]
pub enum OperationFailure<E> {
    /// The operation returned `Err`
    Returned(E),
    /// The operation panicked; holds the panic message
    Panicked(String),
}

impl<E> OperationFailure<E> {
    /// The returned error, if the operation did not panic
    pub fn error(&self) -> Option<&E> {
        match self {
            OperationFailure::Returned(e) => Some(e),
            OperationFailure::Panicked(_) => None,
        }
    }

    /// Whether the operation panicked
    pub fn is_panic(&self) -> bool {
        matches!(self, OperationFailure::Panicked(_))
    }
}

impl<E: fmt::Display> fmt::Display for OperationFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationFailure::Returned(e) => write!(f, "{}", e),
            OperationFailure::Panicked(msg) => write!(f, "panicked: {}", msg),
        }
    }
}

/// A failed iteration, handed back to the caller as received
#[derive(Debug)]
pub struct IterationFailure<E> {
    /// Lane the iteration belongs to
    pub lane: usize,
    /// Iteration index within the lane
    pub iteration: usize,
    /// What went wrong
    pub error: OperationFailure<E>,
}

impl<E: fmt::Display> fmt::Display for IterationFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lane {} iteration {}: {}",
            self.lane, self.iteration, self.error
        )
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
