//! Blocking Parallel Runner
//!
//! Runs a blocking operation on a fixed pool with exactly one thread per lane.
//! Each lane executes its iterations back to back on its own thread and keeps
//! its samples in a lane-local buffer; buffers are sent back over a channel
//! and installed into the sample table once every lane has reported.
//!
//! ## Failure policy
//!
//! Fail-soft: an iteration whose operation returns `Err` (or panics) is
//! recorded as a failed sample, its error is collected for the caller, and the
//! lane carries on with the next iteration.

use crate::error::{HarnessError, IterationFailure, OperationFailure, panic_message};
use crate::measure::{Timer, lane_cpu, pin_to_cpu};
use crate::outcome::{LaneReport, RunOutcome};
use crate::spec::{BenchmarkSpec, RunOptions};
use rayon::ThreadPoolBuilder;
use std::fmt::Display;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use tracing::{debug, error, warn};

/// Runner for blocking operations, one OS thread per lane
#[derive(Debug, Clone, Default)]
pub struct BlockingRunner {
    options: RunOptions,
}

impl BlockingRunner {
    /// Create a runner with the given options
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    /// Options this runner was built with
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run `op(lane, iteration)` for every (lane, iteration) of `spec`
    ///
    /// Blocks until every lane finished, or until the configured timeout.
    pub fn run<F, T, E>(&self, spec: BenchmarkSpec, op: F) -> Result<RunOutcome<E>, HarnessError>
    where
        F: Fn(usize, usize) -> Result<T, E> + Send + Sync + 'static,
        E: Display + Send + 'static,
    {
        let lanes = spec.lanes();
        let iterations_per_lane = spec.iterations_per_lane();

        let pool = ThreadPoolBuilder::new()
            .num_threads(lanes)
            .thread_name(|i| format!("lane-{}", i))
            .build()
            .map_err(|e| HarnessError::WorkerPool(e.to_string()))?;

        debug!(
            lanes,
            iterations_per_lane,
            timeout = ?self.options.timeout,
            "starting blocking run"
        );

        let op = Arc::new(op);
        let (tx, rx) = mpsc::channel();
        let pin_lanes = self.options.pin_lanes;

        let run_timer = Timer::start();
        // One job per pool thread, never queued: thread `lane-k` runs lane k
        pool.spawn_broadcast(move |ctx| {
            let lane = ctx.index();
            if pin_lanes {
                let cpu = lane_cpu(lane);
                if let Err(e) = pin_to_cpu(cpu) {
                    warn!(lane, cpu, error = %e, "failed to pin lane");
                }
            }
            let report = run_lane(lane, iterations_per_lane, op.as_ref());
            // The receiver is gone only after a timeout; nothing left to report to
            let _ = tx.send(report);
        });

        let reports = self.await_lanes(&rx, lanes, &run_timer)?;
        let elapsed = run_timer.stop();

        let outcome = RunOutcome::assemble(&spec, reports, elapsed)?;
        debug!(
            elapsed_ms = outcome.statistics.total_elapsed_ms,
            throughput = outcome.statistics.throughput_per_sec,
            failures = outcome.failures.len(),
            "blocking run finished"
        );
        Ok(outcome)
    }

    /// Barrier join: wait for a report from every lane
    fn await_lanes<E>(
        &self,
        rx: &Receiver<LaneReport<E>>,
        lanes: usize,
        run_timer: &Timer,
    ) -> Result<Vec<LaneReport<E>>, HarnessError> {
        let mut reports = Vec::with_capacity(lanes);

        while reports.len() < lanes {
            let received = match self.options.timeout {
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
                Some(limit) => rx.recv_timeout(limit.saturating_sub(run_timer.elapsed())),
            };

            match received {
                Ok(report) => reports.push(report),
                Err(RecvTimeoutError::Timeout) => {
                    let elapsed = run_timer.elapsed();
                    error!(
                        completed_lanes = reports.len(),
                        lanes,
                        ?elapsed,
                        "blocking run timed out"
                    );
                    return Err(HarnessError::Timeout {
                        elapsed,
                        completed_lanes: reports.len(),
                        lanes,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(HarnessError::LaneLost(format!(
                        "{} of {} lanes reported before the channel closed",
                        reports.len(),
                        lanes
                    )));
                }
            }
        }

        Ok(reports)
    }
}

/// Execute one lane's iterations in order on the current thread
fn run_lane<F, T, E>(lane: usize, iterations: usize, op: &F) -> LaneReport<E>
where
    F: Fn(usize, usize) -> Result<T, E>,
    E: Display,
{
    let mut report = LaneReport::new(lane, iterations);

    for iteration in 0..iterations {
        let timer = Timer::start();
        let result = catch_unwind(AssertUnwindSafe(|| op(lane, iteration)));
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

        warn!(lane, iteration, error = %error, "operation failed");
        report.samples.record_failure(iteration, latency);
        report.failures.push(IterationFailure {
            lane,
            iteration,
            error,
        });
    }

    report
}

/// Run a blocking benchmark with default options
///
/// Equivalent to `BlockingRunner::default().run(BenchmarkSpec::new(lanes, iterations_per_lane)?, op)`.
pub fn run_blocking<F, T, E>(
    iterations_per_lane: usize,
    lanes: usize,
    op: F,
) -> Result<RunOutcome<E>, HarnessError>
where
    F: Fn(usize, usize) -> Result<T, E> + Send + Sync + 'static,
    E: Display + Send + 'static,
{
    let spec = BenchmarkSpec::new(lanes, iterations_per_lane)?;
    BlockingRunner::default().run(spec, op)
}
