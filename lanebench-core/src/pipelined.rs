//! Pipelined Async Runner
//!
//! Runs a non-blocking operation as `lanes` independent chains on the current
//! tokio runtime. Each chain is one task that awaits its iterations strictly
//! in order: iteration n starts only after iteration n-1 resolved. Chains make
//! progress concurrently, limited only by the runtime's worker threads.
//!
//! ## Failure policy
//!
//! Fail-fast per lane: the first failing iteration ends its chain. The failed
//! iteration and every later iteration of that lane stay unwritten in the
//! sample table and show up in `RunStatistics::unwritten_samples`. Other
//! chains are not affected.

use crate::error::{HarnessError, IterationFailure, OperationFailure, panic_message};
use crate::measure::Timer;
use crate::outcome::{LaneReport, RunOutcome};
use crate::spec::{BenchmarkSpec, RunOptions};
use futures::FutureExt;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// Runner for future-returning operations, one task chain per lane
#[derive(Debug, Clone, Default)]
pub struct AsyncRunner {
    options: RunOptions,
}

impl AsyncRunner {
    /// Create a runner with the given options
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    /// Options this runner was built with
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run `op(lane, iteration).await` for every (lane, iteration) of `spec`
    ///
    /// Must be awaited inside a tokio runtime. Resolves once every chain has
    /// settled, or with [`HarnessError::Timeout`] when the configured timeout
    /// expires first (outstanding chains are aborted).
    pub async fn run<F, Fut, T, E>(
        &self,
        spec: BenchmarkSpec,
        op: F,
    ) -> Result<RunOutcome<E>, HarnessError>
    where
        F: Fn(usize, usize) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let lanes = spec.lanes();
        let iterations_per_lane = spec.iterations_per_lane();

        debug!(
            lanes,
            iterations_per_lane,
            timeout = ?self.options.timeout,
            "starting async run"
        );

        let op = Arc::new(op);
        let deadline = self
            .options
            .timeout
            .map(|limit| tokio::time::Instant::now() + limit);

        let run_timer = Timer::start();
        let mut chains = JoinSet::new();
        for lane in 0..lanes {
            chains.spawn(run_chain(lane, iterations_per_lane, Arc::clone(&op)));
        }

        // Barrier join
        let mut reports = Vec::with_capacity(lanes);
        loop {
            let next = match deadline {
                None => chains.join_next().await,
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, chains.join_next()).await {
                        Ok(next) => next,
                        Err(_) => {
                            chains.abort_all();
                            let elapsed = run_timer.elapsed();
                            error!(
                                completed_lanes = reports.len(),
                                lanes,
                                ?elapsed,
                                "async run timed out"
                            );
                            return Err(HarnessError::Timeout {
                                elapsed,
                                completed_lanes: reports.len(),
                                lanes,
                            });
                        }
                    }
                }
            };

            match next {
                Some(Ok(report)) => reports.push(report),
                Some(Err(e)) => {
                    chains.abort_all();
                    return Err(HarnessError::LaneLost(e.to_string()));
                }
                None => break,
            }
        }
        let elapsed = run_timer.stop();

        let outcome = RunOutcome::assemble(&spec, reports, elapsed)?;
        debug!(
            elapsed_ms = outcome.statistics.total_elapsed_ms,
            throughput = outcome.statistics.throughput_per_sec,
            failed_lanes = outcome.failures.len(),
            unwritten = outcome.statistics.unwritten_samples,
            "async run finished"
        );
        Ok(outcome)
    }
}

/// One lane: await each iteration in order, stop at the first failure
async fn run_chain<F, Fut, T, E>(lane: usize, iterations: usize, op: Arc<F>) -> LaneReport<E>
where
    F: Fn(usize, usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut report = LaneReport::new(lane, iterations);

    for iteration in 0..iterations {
        let timer = Timer::start();
        // The closure call sits inside the async block so a panic while
        // building the future is caught as well
        let result = AssertUnwindSafe(async { (*op)(lane, iteration).await })
            .catch_unwind()
            .await;
        let latency = timer.stop();

        let error = match result {
            Ok(Ok(value)) => {
                let _ = std::hint::black_box(value);
                report.samples.record(iteration, latency);
                continue;
            }
            Ok(Err(e)) => OperationFailure::Returned(e),
            Err(panic) => OperationFailure::Panicked(panic_message(panic)),
        };

        warn!(
            lane,
            iteration,
            skipped = iterations - iteration - 1,
            error = %error,
            "operation failed, abandoning rest of lane"
        );
        report.failures.push(IterationFailure {
            lane,
            iteration,
            error,
        });
        break;
    }

    report
}

/// Run an async benchmark with default options
///
/// Equivalent to `AsyncRunner::default().run(BenchmarkSpec::new(lanes, iterations_per_lane)?, op)`.
pub async fn run_async<F, Fut, T, E>(
    iterations_per_lane: usize,
    lanes: usize,
    op: F,
) -> Result<RunOutcome<E>, HarnessError>
where
    F: Fn(usize, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    let spec = BenchmarkSpec::new(lanes, iterations_per_lane)?;
    AsyncRunner::default().run(spec, op).await
}
