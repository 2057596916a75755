//! Sample Table
//!
//! One slot per (lane, iteration) pair, addressed by
//! `lane * iterations_per_lane + iteration`. Lanes never touch the table
//! directly: each lane fills its own [`LaneSamples`] buffer, and the buffer is
//! installed into the lane's slice once the lane has finished. Slices are
//! disjoint, so the table needs no synchronization.

use std::time::Duration;

/// Outcome of a single iteration as seen by the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sample {
    /// The iteration never completed (skipped or still pending)
    #[default]
    Unwritten,
    /// The operation returned successfully after `Duration`
    Completed(Duration),
    /// The operation returned an error (or panicked) after `Duration`
    Failed(Duration),
}

impl Sample {
    /// Measured latency, if the slot was written
    #[inline]
    pub fn latency(&self) -> Option<Duration> {
        match *self {
            Sample::Unwritten => None,
            Sample::Completed(d) | Sample::Failed(d) => Some(d),
        }
    }

    /// Whether the slot holds a measurement
    #[inline]
    pub fn is_written(&self) -> bool {
        !matches!(self, Sample::Unwritten)
    }

    /// Whether the measured operation failed
    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, Sample::Failed(_))
    }
}

/// Lane-local sample buffer, owned by exactly one lane while it runs
#[derive(Debug, Clone)]
pub struct LaneSamples {
    lane: usize,
    samples: Vec<Sample>,
}

impl LaneSamples {
    /// Create an all-unwritten buffer for `lane`
    pub fn new(lane: usize, iterations_per_lane: usize) -> Self {
        Self {
            lane,
            samples: vec![Sample::Unwritten; iterations_per_lane],
        }
    }

    /// Lane this buffer belongs to
    pub fn lane(&self) -> usize {
        self.lane
    }

    /// Record a successful iteration
    #[inline]
    pub fn record(&mut self, iteration: usize, latency: Duration) {
        self.samples[iteration] = Sample::Completed(latency);
    }

    /// Record a failed iteration
    #[inline]
    pub fn record_failure(&mut self, iteration: usize, latency: Duration) {
        self.samples[iteration] = Sample::Failed(latency);
    }

    /// Samples recorded so far, indexed by iteration
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of written slots
    pub fn written(&self) -> usize {
        self.samples.iter().filter(|s| s.is_written()).count()
    }
}

/// Fixed-size table holding every sample of a run
#[derive(Debug, Clone)]
pub struct SampleTable {
    lanes: usize,
    iterations_per_lane: usize,
    samples: Vec<Sample>,
}

impl SampleTable {
    /// Create a table with every slot unwritten
    pub fn new(lanes: usize, iterations_per_lane: usize) -> Self {
        Self {
            lanes,
            iterations_per_lane,
            samples: vec![Sample::Unwritten; lanes * iterations_per_lane],
        }
    }

    /// Number of lanes
    pub fn lanes(&self) -> usize {
        self.lanes
    }

    /// Iterations executed by each lane
    pub fn iterations_per_lane(&self) -> usize {
        self.iterations_per_lane
    }

    /// Total slot count (`lanes * iterations_per_lane`)
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the table has no slots
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Flat index of a (lane, iteration) pair
    #[inline]
    pub fn index(&self, lane: usize, iteration: usize) -> usize {
        lane * self.iterations_per_lane + iteration
    }

    /// Sample for a (lane, iteration) pair
    pub fn get(&self, lane: usize, iteration: usize) -> Option<&Sample> {
        if lane >= self.lanes || iteration >= self.iterations_per_lane {
            return None;
        }
        self.samples.get(self.index(lane, iteration))
    }

    /// All samples of one lane, in iteration order
    ///
    /// # Panics
    /// If `lane` is out of range; use [`SampleTable::get`] for a checked lookup.
    pub fn lane(&self, lane: usize) -> &[Sample] {
        assert!(
            lane < self.lanes,
            "lane {} out of range ({} lanes)",
            lane,
            self.lanes
        );
        let start = self.index(lane, 0);
        &self.samples[start..start + self.iterations_per_lane]
    }

    /// Copy a finished lane buffer into that lane's slice
    ///
    /// # Panics
    /// If the buffer's lane is out of range or its length does not match
    /// `iterations_per_lane`.
    pub fn install(&mut self, lane_samples: LaneSamples) {
        assert!(
            lane_samples.lane < self.lanes,
            "lane {} out of range ({} lanes)",
            lane_samples.lane,
            self.lanes
        );
        assert_eq!(lane_samples.samples.len(), self.iterations_per_lane);

        let start = self.index(lane_samples.lane, 0);
        self.samples[start..start + self.iterations_per_lane]
            .copy_from_slice(&lane_samples.samples);
    }

    /// All samples in index order
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of slots that were never written
    pub fn unwritten_count(&self) -> usize {
        self.samples.iter().filter(|s| !s.is_written()).count()
    }
}
