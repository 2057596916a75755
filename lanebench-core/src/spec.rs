//! Run Shape and Options

use crate::error::HarnessError;
use std::time::Duration;

/// Concurrency shape of a run: `lanes` lanes of `iterations_per_lane` each
///
/// The operation itself is passed to the runner alongside the spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkSpec {
    lanes: usize,
    iterations_per_lane: usize,
}

impl BenchmarkSpec {
    /// Validate and build a run shape
    ///
    /// # Errors
    /// [`HarnessError::InvalidConfiguration`] when either count is zero or
    /// the total iteration count overflows.
    pub fn new(lanes: usize, iterations_per_lane: usize) -> Result<Self, HarnessError> {
        if lanes == 0 {
            return Err(HarnessError::InvalidConfiguration(
                "lanes must be at least 1".to_string(),
            ));
        }
        if iterations_per_lane == 0 {
            return Err(HarnessError::InvalidConfiguration(
                "iterations per lane must be at least 1".to_string(),
            ));
        }
        if lanes.checked_mul(iterations_per_lane).is_none() {
            return Err(HarnessError::InvalidConfiguration(format!(
                "{} lanes x {} iterations overflows the sample table",
                lanes, iterations_per_lane
            )));
        }

        Ok(Self {
            lanes,
            iterations_per_lane,
        })
    }

    /// Split a total iteration budget evenly over `lanes`
    ///
    /// The remainder is dropped, so `total / lanes` must be at least 1.
    pub fn split(total_iterations: usize, lanes: usize) -> Result<Self, HarnessError> {
        if lanes == 0 {
            return Err(HarnessError::InvalidConfiguration(
                "lanes must be at least 1".to_string(),
            ));
        }
        if total_iterations < lanes {
            return Err(HarnessError::InvalidConfiguration(format!(
                "{} iterations cannot be spread over {} lanes",
                total_iterations, lanes
            )));
        }
        Self::new(lanes, total_iterations / lanes)
    }

    /// Number of lanes
    pub fn lanes(&self) -> usize {
        self.lanes
    }

    /// Iterations each lane runs sequentially
    pub fn iterations_per_lane(&self) -> usize {
        self.iterations_per_lane
    }

    /// `lanes * iterations_per_lane`
    pub fn total_iterations(&self) -> usize {
        self.lanes * self.iterations_per_lane
    }
}

/// Options shared by both runners
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Bound on the barrier wait. `None` waits as long as the slowest lane.
    pub timeout: Option<Duration>,
    /// Pin each blocking lane to a core (ignored by the async runner)
    pub pin_lanes: bool,
}

impl RunOptions {
    /// Set a bounded barrier wait
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable or disable lane pinning
    pub fn with_pinning(mut self, pin_lanes: bool) -> Self {
        self.pin_lanes = pin_lanes;
        self
    }
}
