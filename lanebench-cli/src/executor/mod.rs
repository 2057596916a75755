//! Benchmark Executor
//!
//! Runs a workload under the selected lane runner and turns the outcome into
//! a report.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ExecutionConfig + Workload
//!       │
//!       ▼
//! ┌─────────────┐
//! │  execution  │  Drive lanes, collect samples, aggregate
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │   report    │  Metadata, statistics, failure records
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ formatting  │  Human-readable output (or JSON)
//! └─────────────┘
//! ```

mod execution;
mod formatting;
mod report;

pub use execution::{ExecutionConfig, execute};
pub use formatting::format_human_output;
pub use report::{
    FailureRecord, OutputFormat, Report, ReportMeta, build_report, generate_json_report,
};
