#![warn(missing_docs)]
//! LaneBench Core - Lane Runners
//!
//! This crate drives a user-supplied operation under a fixed concurrency shape
//! (`lanes` parallel lanes, `iterations_per_lane` sequential iterations each)
//! and records one latency sample per iteration:
//! - `BlockingRunner`: one pool thread per lane, fail-soft on operation errors
//! - `AsyncRunner`: one task chain per lane on tokio, fail-fast per lane
//! - `Timer` for wall-clock measurement, CPU pinning for blocking lanes

mod blocking;
mod error;
mod measure;
mod outcome;
mod pipelined;
mod spec;

pub use blocking::{BlockingRunner, run_blocking};
pub use error::{HarnessError, IterationFailure, OperationFailure};
pub use measure::{Timer, lane_cpu, pin_to_cpu};
pub use outcome::RunOutcome;
pub use pipelined::{AsyncRunner, run_async};
pub use spec::{BenchmarkSpec, RunOptions};
