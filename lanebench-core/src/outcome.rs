//! Run Outcome
//!
//! Joins the lane reports collected at the barrier into one sample table and
//! derives the run statistics from it.

use crate::error::{HarnessError, IterationFailure};
use crate::spec::BenchmarkSpec;
use lanebench_stats::{LaneSamples, RunStatistics, SampleTable, aggregate};
use std::time::Duration;

/// What a lane hands back when it finishes
#[derive(Debug)]
pub(crate) struct LaneReport<E> {
    pub samples: LaneSamples,
    pub failures: Vec<IterationFailure<E>>,
}

impl<E> LaneReport<E> {
    pub fn new(lane: usize, iterations_per_lane: usize) -> Self {
        Self {
            samples: LaneSamples::new(lane, iterations_per_lane),
            failures: Vec::new(),
        }
    }
}

/// Result of a finished run
#[derive(Debug)]
pub struct RunOutcome<E> {
    /// Aggregate throughput and latency
    pub statistics: RunStatistics,
    /// Every sample of the run, indexed by (lane, iteration)
    pub table: SampleTable,
    /// Failed iterations ordered by (lane, iteration)
    pub failures: Vec<IterationFailure<E>>,
}

impl<E> RunOutcome<E> {
    /// Build the table from lane reports and aggregate it
    pub(crate) fn assemble(
        spec: &BenchmarkSpec,
        reports: Vec<LaneReport<E>>,
        elapsed: Duration,
    ) -> Result<Self, HarnessError> {
        let mut table = SampleTable::new(spec.lanes(), spec.iterations_per_lane());
        let mut failures = Vec::new();

        for report in reports {
            table.install(report.samples);
            failures.extend(report.failures);
        }
        failures.sort_by_key(|f| (f.lane, f.iteration));

        let statistics = aggregate(&table, elapsed)?;

        Ok(Self {
            statistics,
            table,
            failures,
        })
    }

    /// Whether any iteration failed
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
