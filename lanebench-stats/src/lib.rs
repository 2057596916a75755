#![warn(missing_docs)]
//! LaneBench Statistics
//!
//! Sample storage and aggregation shared by both runners:
//! - `SampleTable` with one slot per (lane, iteration), partitioned by lane
//! - `LaneSamples` buffers owned by a single lane while it runs
//! - `aggregate` reducing a table to throughput and min/max/mean latency

mod sample;
mod summary;

pub use sample::{LaneSamples, Sample, SampleTable};
pub use summary::{LatencySummary, RunStatistics, StatsError, aggregate};
