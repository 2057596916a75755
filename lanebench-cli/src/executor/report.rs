//! Report Building
//!
//! Turns a run outcome into a serializable [`Report`]: run metadata, the
//! aggregated statistics and one record per failed iteration.

use super::execution::ExecutionConfig;
use crate::config::RunMode;
use crate::workload::{Workload, WorkloadError};
use chrono::{DateTime, Utc};
use lanebench_core::RunOutcome;
use lanebench_stats::RunStatistics;
use serde::{Deserialize, Serialize};

/// Output format for the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Human,
    /// Pretty-printed JSON
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Complete report of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Run metadata
    pub meta: ReportMeta,
    /// Aggregated statistics
    pub statistics: RunStatistics,
    /// Failed iterations, ordered by lane then iteration
    pub failures: Vec<FailureRecord>,
}

/// Run metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// lanebench version
    pub version: String,
    /// When the report was built
    pub timestamp: DateTime<Utc>,
    /// Runner used
    pub mode: RunMode,
    /// Parallel lanes
    pub lanes: usize,
    /// Sequential iterations per lane
    pub iterations_per_lane: usize,
    /// Workload description
    pub workload: String,
    /// Configured timeout in milliseconds, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// One failed iteration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Lane of the failing iteration
    pub lane: usize,
    /// Iteration index within the lane
    pub iteration: usize,
    /// Error or panic message
    pub message: String,
    /// Whether the operation panicked
    pub panicked: bool,
}

/// Build a report from a finished run
pub fn build_report(
    config: &ExecutionConfig,
    workload: &Workload,
    outcome: &RunOutcome<WorkloadError>,
) -> Report {
    let failures = outcome
        .failures
        .iter()
        .map(|failure| FailureRecord {
            lane: failure.lane,
            iteration: failure.iteration,
            message: failure.error.to_string(),
            panicked: failure.error.is_panic(),
        })
        .collect();

    Report {
        meta: ReportMeta {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            mode: config.mode,
            lanes: config.spec.lanes(),
            iterations_per_lane: config.spec.iterations_per_lane(),
            workload: workload.describe(),
            timeout_ms: config.options.timeout.map(|t| t.as_millis() as u64),
        },
        statistics: outcome.statistics.clone(),
        failures,
    }
}

/// Generate a prettified JSON report
pub fn generate_json_report(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
