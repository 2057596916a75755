//! Run Statistics
//!
//! Reduces a finished [`SampleTable`] to the figures reported for a run:
//! - Throughput computed over ALL iterations and the run's wall-clock time
//! - Min, max and mean computed over WRITTEN samples only (completed or failed)
//! - Unwritten slots counted separately, never folded in as zero latency

use crate::sample::{Sample, SampleTable};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors from aggregation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatsError {
    /// The table has no slots
    #[error("Sample table is empty: a run needs at least one iteration")]
    EmptyTable,
}

/// Latency extremes and mean, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    /// Fastest written sample
    pub min_ms: f64,
    /// Slowest written sample
    pub max_ms: f64,
    /// Mean over written samples
    pub mean_ms: f64,
}

/// Aggregate statistics for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// `lanes * iterations_per_lane`
    pub total_iterations: u64,
    /// Wall-clock time of the whole run
    pub total_elapsed_ms: f64,
    /// `total_iterations * 1000 / total_elapsed_ms`
    pub throughput_per_sec: f64,
    /// `None` when no sample was written
    pub latency: Option<LatencySummary>,
    /// Written slots (completed + failed)
    pub recorded_samples: u64,
    /// Written slots whose operation failed
    pub failed_samples: u64,
    /// Slots never written
    pub unwritten_samples: u64,
}

impl RunStatistics {
    /// Minimum latency in milliseconds
    pub fn min_latency_ms(&self) -> Option<f64> {
        self.latency.map(|l| l.min_ms)
    }

    /// Maximum latency in milliseconds
    pub fn max_latency_ms(&self) -> Option<f64> {
        self.latency.map(|l| l.max_ms)
    }

    /// Mean latency in milliseconds
    pub fn mean_latency_ms(&self) -> Option<f64> {
        self.latency.map(|l| l.mean_ms)
    }

    /// True when every slot of the table was written
    pub fn is_complete(&self) -> bool {
        self.unwritten_samples == 0
    }

    /// True when the run saw no failed or skipped iteration
    pub fn is_clean(&self) -> bool {
        self.is_complete() && self.failed_samples == 0
    }
}

const NANOS_PER_MILLI: f64 = 1_000_000.0;

fn as_millis_f64(d: Duration) -> f64 {
    d.as_nanos() as f64 / NANOS_PER_MILLI
}

/// Aggregate a finished sample table
///
/// # Arguments
/// * `table` - Samples of every lane, after the barrier join
/// * `elapsed` - Wall-clock time of the whole run
///
/// # Errors
/// [`StatsError::EmptyTable`] when the table has no slots.
pub fn aggregate(table: &SampleTable, elapsed: Duration) -> Result<RunStatistics, StatsError> {
    if table.is_empty() {
        return Err(StatsError::EmptyTable);
    }

    let mut min = Duration::MAX;
    let mut max = Duration::ZERO;
    let mut sum_nanos = 0u128;
    let mut recorded = 0u64;
    let mut failed = 0u64;
    let mut unwritten = 0u64;

    for sample in table.samples() {
        match *sample {
            Sample::Unwritten => unwritten += 1,
            Sample::Completed(d) | Sample::Failed(d) => {
                if sample.is_failed() {
                    failed += 1;
                }
                recorded += 1;
                sum_nanos = sum_nanos.saturating_add(d.as_nanos());
                min = min.min(d);
                max = max.max(d);
            }
        }
    }

    let latency = (recorded > 0).then(|| {
        let min_ms = as_millis_f64(min);
        let max_ms = as_millis_f64(max);
        // Mean from integer nanoseconds, clamped against last-ulp rounding
        let mean_ms =
            (sum_nanos as f64 / recorded as f64 / NANOS_PER_MILLI).clamp(min_ms, max_ms);
        LatencySummary {
            min_ms,
            max_ms,
            mean_ms,
        }
    });

    let total_iterations = table.len() as u64;
    // Clamp so a run faster than the clock resolution still yields a finite rate
    let elapsed_ms = as_millis_f64(elapsed.max(Duration::from_nanos(1)));
    let throughput_per_sec = total_iterations as f64 * 1000.0 / elapsed_ms;

    Ok(RunStatistics {
        total_iterations,
        total_elapsed_ms: as_millis_f64(elapsed),
        throughput_per_sec,
        latency,
        recorded_samples: recorded,
        failed_samples: failed,
        unwritten_samples: unwritten,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::LaneSamples;

    fn table_from(lanes: &[&[u64]]) -> SampleTable {
        let per_lane = lanes[0].len();
        let mut table = SampleTable::new(lanes.len(), per_lane);
        for (lane, millis) in lanes.iter().enumerate() {
            let mut buf = LaneSamples::new(lane, per_lane);
            for (i, ms) in millis.iter().enumerate() {
                buf.record(i, Duration::from_millis(*ms));
            }
            table.install(buf);
        }
        table
    }

    #[test]
    fn test_basic_aggregate() {
        let table = table_from(&[&[1, 2, 3], &[4, 5, 6]]);
        let stats = aggregate(&table, Duration::from_millis(100)).unwrap();

        assert_eq!(stats.total_iterations, 6);
        assert_eq!(stats.recorded_samples, 6);
        assert_eq!(stats.unwritten_samples, 0);
        assert!((stats.min_latency_ms().unwrap() - 1.0).abs() < 1e-9);
        assert!((stats.max_latency_ms().unwrap() - 6.0).abs() < 1e-9);
        assert!((stats.mean_latency_ms().unwrap() - 3.5).abs() < 1e-9);
        // 6 iterations in 100ms = 60/s
        assert!((stats.throughput_per_sec - 60.0).abs() < 1e-6);
        assert!((stats.total_elapsed_ms - 100.0).abs() < 1e-9);
        assert!(stats.is_clean());
    }

    #[test]
    fn test_min_mean_max_ordering() {
        let table = table_from(&[&[7, 3, 9, 1], &[2, 8, 4, 6]]);
        let stats = aggregate(&table, Duration::from_secs(1)).unwrap();
        let l = stats.latency.unwrap();
        assert!(l.min_ms <= l.mean_ms);
        assert!(l.mean_ms <= l.max_ms);
    }

    fn table_of_nanos(
        lanes: usize,
        per_lane: usize,
        nanos: impl Fn(usize, usize) -> u64,
    ) -> SampleTable {
        let mut table = SampleTable::new(lanes, per_lane);
        for lane in 0..lanes {
            let mut buf = LaneSamples::new(lane, per_lane);
            for i in 0..per_lane {
                buf.record(i, Duration::from_nanos(nanos(lane, i)));
            }
            table.install(buf);
        }
        table
    }

    #[test]
    fn test_equal_samples_mean_equals_extremes() {
        for nanos in [1, 7, 333, 422, 999, 1_001, 123_457, 3_000_001] {
            for count in [3, 7, 10, 49] {
                let table = table_of_nanos(1, count, |_, _| nanos);
                let l = aggregate(&table, Duration::from_millis(1)).unwrap().latency.unwrap();
                assert_eq!(l.min_ms, l.max_ms);
                assert!(l.min_ms <= l.mean_ms, "{}ns x{}: {:?}", nanos, count, l);
                assert!(l.mean_ms <= l.max_ms, "{}ns x{}: {:?}", nanos, count, l);
            }
        }
    }

    #[test]
    fn test_sub_microsecond_ordering() {
        let table = table_of_nanos(4, 25, |lane, i| 100 + ((lane * 31 + i * 17) % 900) as u64);
        let l = aggregate(&table, Duration::from_micros(50)).unwrap().latency.unwrap();
        assert!(l.min_ms >= 0.0001);
        assert!(l.max_ms < 0.001);
        assert!(l.min_ms <= l.mean_ms);
        assert!(l.mean_ms <= l.max_ms);
    }

    #[test]
    fn test_unwritten_excluded_from_latency() {
        let mut table = SampleTable::new(2, 2);
        let mut lane0 = LaneSamples::new(0, 2);
        lane0.record(0, Duration::from_millis(10));
        lane0.record(1, Duration::from_millis(20));
        table.install(lane0);
        // Lane 1 never wrote anything

        let stats = aggregate(&table, Duration::from_millis(50)).unwrap();
        assert_eq!(stats.total_iterations, 4);
        assert_eq!(stats.recorded_samples, 2);
        assert_eq!(stats.unwritten_samples, 2);
        assert!(!stats.is_complete());
        // Zero-latency slots would have pulled min to 0 and mean to 7.5
        assert!((stats.min_latency_ms().unwrap() - 10.0).abs() < 1e-9);
        assert!((stats.mean_latency_ms().unwrap() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_failed_samples_counted_and_measured() {
        let mut table = SampleTable::new(1, 2);
        let mut lane = LaneSamples::new(0, 2);
        lane.record_failure(0, Duration::from_millis(4));
        lane.record(1, Duration::from_millis(2));
        table.install(lane);

        let stats = aggregate(&table, Duration::from_millis(10)).unwrap();
        assert_eq!(stats.recorded_samples, 2);
        assert_eq!(stats.failed_samples, 1);
        assert!(stats.is_complete());
        assert!(!stats.is_clean());
        assert!((stats.max_latency_ms().unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_nothing_written() {
        let table = SampleTable::new(1, 1);
        let stats = aggregate(&table, Duration::from_millis(1)).unwrap();
        assert_eq!(stats.total_iterations, 1);
        assert_eq!(stats.recorded_samples, 0);
        assert_eq!(stats.unwritten_samples, 1);
        assert!(stats.latency.is_none());
    }

    #[test]
    fn test_empty_table_rejected() {
        let table = SampleTable::new(0, 10);
        assert_eq!(
            aggregate(&table, Duration::from_millis(1)),
            Err(StatsError::EmptyTable)
        );
    }

    #[test]
    fn test_zero_elapsed_gives_finite_throughput() {
        let table = table_from(&[&[0]]);
        let stats = aggregate(&table, Duration::ZERO).unwrap();
        assert!(stats.throughput_per_sec.is_finite());
        assert!(stats.throughput_per_sec > 0.0);
    }

    #[test]
    fn test_serializes_to_json() {
        let table = table_from(&[&[1, 2]]);
        let stats = aggregate(&table, Duration::from_millis(4)).unwrap();
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"total_iterations\":2"));
        assert!(json.contains("\"min_ms\""));
    }
}
