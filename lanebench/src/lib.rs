#![warn(missing_docs)]
//! # LaneBench
//!
//! Concurrent load benchmark harness: drive an operation under a fixed
//! concurrency shape and measure every iteration.
//!
//! - **Blocking lanes**: one pool thread per lane, iterations run back to back,
//!   failures are recorded and the lane keeps going
//! - **Pipelined async lanes**: one task chain per lane on tokio, iterations
//!   awaited in order, the first failure ends its lane
//! - **Statistics**: throughput plus min/max/mean latency, with failed and
//!   unwritten samples counted separately
//!
//! ## Quick Start
//!
//! ```ignore
//! use lanebench::prelude::*;
//!
//! let outcome = run_blocking(250, 4, |lane, iteration| client.query(lane, iteration))?;
//! println!("{:.0}/second", outcome.statistics.throughput_per_sec);
//! ```
//!
//! ## Async Operations
//!
//! ```ignore
//! let outcome = run_async(250, 4, move |lane, iteration| {
//!     let client = client.clone();
//!     async move { client.query(lane, iteration).await }
//! })
//! .await?;
//! ```

// Re-export runners
pub use lanebench_core::{
    AsyncRunner, BenchmarkSpec, BlockingRunner, HarnessError, IterationFailure, OperationFailure,
    RunOptions, RunOutcome, Timer, run_async, run_blocking,
};

// Re-export stats
pub use lanebench_stats::{
    LaneSamples, LatencySummary, RunStatistics, Sample, SampleTable, StatsError, aggregate,
};

// Re-export the CLI entry point
pub use lanebench_cli::run;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AsyncRunner, BenchmarkSpec, BlockingRunner, HarnessError, RunOptions, RunOutcome,
        RunStatistics, run_async, run_blocking,
    };
}
