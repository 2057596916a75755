//! Benchmark Execution
//!
//! Drives a synthetic workload through one of the lane runners.
//!
//! ## Execution Modes
//!
//! - **Blocking (`BlockingRunner`)**: one pool thread per lane, the workload
//!   blocks the lane's thread for every iteration. Failures are recorded and
//!   the lane continues.
//!
//! - **Async (`AsyncRunner`)**: one task chain per lane on a multi-threaded
//!   tokio runtime built for the run. The first failure ends its lane.
//!
//! ## Data Flow
//!
//! ```text
//!   LaneConfig (lanebench.toml + CLI)
//!        │
//!        ▼
//!   ExecutionConfig ──── Workload
//!        │
//!        ▼
//! ┌──────────────────┐
//! │ BlockingRunner/  │  Lanes → Samples → Barrier
//! │ AsyncRunner      │
//! └────────┬─────────┘
//!          │
//!          ▼
//!  RunOutcome (statistics, sample table, failures)
//! ```

use crate::config::{LaneConfig, RunMode};
use crate::workload::{Workload, WorkloadError};
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use lanebench_core::{AsyncRunner, BenchmarkSpec, BlockingRunner, RunOptions, RunOutcome};

/// Configuration for one benchmark run
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Runner selection
    pub mode: RunMode,
    /// Lanes and iterations per lane
    pub spec: BenchmarkSpec,
    /// Timeout and pinning
    pub options: RunOptions,
    /// Async runtime worker threads (None = tokio default)
    pub worker_threads: Option<usize>,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

impl ExecutionConfig {
    /// Resolve the run shape and options from configuration
    ///
    /// The total iteration budget is split evenly over the lanes; the
    /// remainder is dropped.
    pub fn from_config(config: &LaneConfig) -> anyhow::Result<Self> {
        let spec = BenchmarkSpec::split(config.run.iterations, config.run.lanes)?;
        let options = RunOptions {
            timeout: config.timeout()?,
            pin_lanes: config.run.pin_lanes,
        };

        Ok(Self {
            mode: config.run.mode,
            spec,
            options,
            worker_threads: config.run.worker_threads,
            show_progress: config.output.progress,
        })
    }
}

fn progress_bar(total: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Run `workload` under the configured runner
pub fn execute(
    config: &ExecutionConfig,
    workload: &Workload,
) -> anyhow::Result<RunOutcome<WorkloadError>> {
    let pb = progress_bar(config.spec.total_iterations() as u64, config.show_progress);
    pb.set_message(format!("{} lanes", config.spec.lanes()));

    let outcome = match config.mode {
        RunMode::Blocking => {
            let workload = workload.clone();
            let progress = pb.clone();
            BlockingRunner::new(config.options).run(config.spec, move |lane, iteration| {
                let result = workload.execute(lane, iteration);
                progress.inc(1);
                result
            })
        }
        RunMode::Async => {
            let mut builder = tokio::runtime::Builder::new_multi_thread();
            if let Some(threads) = config.worker_threads {
                builder.worker_threads(threads.max(1));
            }
            let runtime = builder
                .enable_all()
                .build()
                .context("building async runtime")?;

            let workload = workload.clone();
            let progress = pb.clone();
            let runner = AsyncRunner::new(config.options);
            runtime.block_on(runner.run(config.spec, move |lane, iteration| {
                let operation = workload.execute_async(lane, iteration);
                let progress = progress.clone();
                async move {
                    let result = operation.await;
                    progress.inc(1);
                    result
                }
            }))
        }
    };

    match &outcome {
        Ok(_) => pb.finish_with_message("Complete"),
        Err(_) => pb.abandon_with_message("Aborted"),
    }

    Ok(outcome?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkloadKind;
    use std::time::Duration;

    fn quiet(mode: RunMode, lanes: usize, iterations_per_lane: usize) -> ExecutionConfig {
        ExecutionConfig {
            mode,
            spec: BenchmarkSpec::new(lanes, iterations_per_lane).unwrap(),
            options: RunOptions::default(),
            worker_threads: Some(2),
            show_progress: false,
        }
    }

    fn noop(failure_rate: f64) -> Workload {
        Workload::new(WorkloadKind::Noop, Duration::ZERO, Duration::ZERO, failure_rate).unwrap()
    }

    #[test]
    fn test_from_config_splits_iterations() {
        let mut config = LaneConfig::default();
        config.run.iterations = 103;
        config.run.lanes = 4;
        config.run.timeout = Some("2s".to_string());

        let exec = ExecutionConfig::from_config(&config).unwrap();
        assert_eq!(exec.spec.lanes(), 4);
        assert_eq!(exec.spec.iterations_per_lane(), 25);
        assert_eq!(exec.options.timeout, Some(Duration::from_secs(2)));
        assert!(exec.show_progress);

        config.output.progress = false;
        assert!(!ExecutionConfig::from_config(&config).unwrap().show_progress);
    }

    #[test]
    fn test_from_config_rejects_zero_lanes() {
        let mut config = LaneConfig::default();
        config.run.lanes = 0;
        assert!(ExecutionConfig::from_config(&config).is_err());
    }

    #[test]
    fn test_execute_blocking() {
        let outcome = execute(&quiet(RunMode::Blocking, 4, 10), &noop(0.0)).unwrap();
        assert_eq!(outcome.statistics.total_iterations, 40);
        assert!(outcome.statistics.is_clean());
    }

    #[test]
    fn test_execute_async() {
        let outcome = execute(&quiet(RunMode::Async, 4, 10), &noop(0.0)).unwrap();
        assert_eq!(outcome.statistics.total_iterations, 40);
        assert!(outcome.statistics.is_clean());
    }

    #[test]
    fn test_execute_failure_policies_differ() {
        let blocking = execute(&quiet(RunMode::Blocking, 2, 5), &noop(1.0)).unwrap();
        assert_eq!(blocking.failures.len(), 10);
        assert_eq!(blocking.statistics.unwritten_samples, 0);

        let pipelined = execute(&quiet(RunMode::Async, 2, 5), &noop(1.0)).unwrap();
        assert_eq!(pipelined.failures.len(), 2);
        assert_eq!(pipelined.statistics.unwritten_samples, 10);
    }
}
