//! Configuration loading from lanebench.toml
//!
//! LaneBench configuration can be specified in a `lanebench.toml` file in the project root.
//! The configuration is automatically discovered by walking up from the current directory.
//! Command-line flags override values from the file.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Name of the configuration file looked up during discovery
pub const CONFIG_FILE_NAME: &str = "lanebench.toml";

/// LaneBench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LaneConfig {
    /// Run shape and runner selection
    #[serde(default)]
    pub run: RunConfig,
    /// Synthetic workload driven by the runners
    #[serde(default)]
    pub workload: WorkloadConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Which runner drives the workload
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// One pool thread per lane, blocking operation (default)
    #[default]
    Blocking,
    /// One task chain per lane on a tokio runtime
    Async,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Blocking => write!(f, "blocking"),
            RunMode::Async => write!(f, "async"),
        }
    }
}

/// Run shape configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Runner: "blocking" or "async"
    #[serde(default)]
    pub mode: RunMode,
    /// Total iterations, spread evenly over the lanes (remainder dropped)
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Number of parallel lanes
    #[serde(default = "default_lanes")]
    pub lanes: usize,
    /// Bound on the wait for all lanes (e.g., "60s"); absent = wait indefinitely
    #[serde(default)]
    pub timeout: Option<String>,
    /// Pin blocking lanes to CPU cores
    #[serde(default)]
    pub pin_lanes: bool,
    /// Worker threads of the async runtime (default: one per core)
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            iterations: default_iterations(),
            lanes: default_lanes(),
            timeout: None,
            pin_lanes: false,
            worker_threads: None,
        }
    }
}

fn default_iterations() -> usize {
    1_000
}
fn default_lanes() -> usize {
    1
}

/// Synthetic operation kinds
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum WorkloadKind {
    /// Return immediately
    Noop,
    /// Sleep for the configured latency (default)
    #[default]
    Sleep,
    /// Busy-wait for the configured latency
    Spin,
}

impl std::fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkloadKind::Noop => write!(f, "noop"),
            WorkloadKind::Sleep => write!(f, "sleep"),
            WorkloadKind::Spin => write!(f, "spin"),
        }
    }
}

/// Workload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    /// Operation kind: "noop", "sleep" or "spin"
    #[serde(default)]
    pub kind: WorkloadKind,
    /// Base latency per iteration (e.g., "1ms")
    #[serde(default = "default_latency")]
    pub latency: String,
    /// Uniform jitter around the base latency (e.g., "200us")
    #[serde(default = "default_jitter")]
    pub jitter: String,
    /// Probability in [0, 1] that an iteration fails
    #[serde(default)]
    pub failure_rate: f64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            kind: WorkloadKind::default(),
            latency: default_latency(),
            jitter: default_jitter(),
            failure_rate: 0.0,
        }
    }
}

fn default_latency() -> String {
    "1ms".to_string()
}
fn default_jitter() -> String {
    "0ns".to_string()
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Report format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
    /// Report file (stdout if not specified)
    #[serde(default)]
    pub path: Option<String>,
    /// Draw a progress bar on stderr (its update is timed with each iteration)
    #[serde(default = "default_progress")]
    pub progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            path: None,
            progress: default_progress(),
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}
fn default_progress() -> bool {
    true
}

impl LaneConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!(path = %config_path.display(), error = %e, "ignoring unreadable config");
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Bounded wait for the run, if configured
    pub fn timeout(&self) -> anyhow::Result<Option<Duration>> {
        self.run
            .timeout
            .as_deref()
            .map(Self::parse_duration)
            .transpose()
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# LaneBench Configuration

[run]
# Runner: "blocking" (one thread per lane) or "async" (one task chain per lane)
mode = "blocking"
# Total iterations; each lane runs iterations / lanes of them
iterations = 1000
# Number of parallel lanes
lanes = 1
# Bound on the wait for all lanes (uncomment to enable; default waits indefinitely)
# timeout = "60s"
# Pin blocking lanes to CPU cores
pin_lanes = false
# Async runtime worker threads (uncomment to override; default = one per core)
# worker_threads = 4

[workload]
# Operation kind: noop, sleep, spin
kind = "sleep"
# Base latency per iteration
latency = "1ms"
# Uniform jitter around the base latency
jitter = "0ns"
# Probability that an iteration fails (0.0 to 1.0)
failure_rate = 0.0

[output]
# Report format: human, json
format = "human"
# Report file (uncomment to enable; default prints to stdout)
# path = "target/lanebench/report.json"
# Progress bar on stderr; disable for the tightest latency measurements
progress = true
"#
        .to_string()
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m")
    pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Duration must be non-negative: {}", s));
        }

        let multiplier: f64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1.0,
            "us" | "µs" => 1_000.0,
            "ms" => 1_000_000.0,
            "s" => 1_000_000_000.0,
            "m" | "min" => 60_000_000_000.0,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok(Duration::from_nanos((value * multiplier) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LaneConfig::default();
        assert_eq!(config.run.mode, RunMode::Blocking);
        assert_eq!(config.run.iterations, 1_000);
        assert_eq!(config.run.lanes, 1);
        assert!(config.run.timeout.is_none());
        assert_eq!(config.workload.kind, WorkloadKind::Sleep);
        assert_eq!(config.output.format, "human");
        assert!(config.output.progress);
    }

    #[test]
    fn test_parse_duration() {
        let d = LaneConfig::parse_duration;
        assert_eq!(d("3s").unwrap(), Duration::from_secs(3));
        assert_eq!(d("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(d("100us").unwrap(), Duration::from_micros(100));
        assert_eq!(d("1000ns").unwrap(), Duration::from_nanos(1000));
        assert_eq!(d("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(d("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(d("7").unwrap(), Duration::from_secs(7));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(LaneConfig::parse_duration("").is_err());
        assert!(LaneConfig::parse_duration("fast").is_err());
        assert!(LaneConfig::parse_duration("3 parsecs").is_err());
        assert!(LaneConfig::parse_duration("-1s").is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [run]
            mode = "async"
            lanes = 8
            timeout = "30s"

            [workload]
            kind = "noop"
            failure_rate = 0.25

            [output]
            progress = false
        "#;

        let config: LaneConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.run.mode, RunMode::Async);
        assert_eq!(config.run.lanes, 8);
        assert_eq!(config.timeout().unwrap(), Some(Duration::from_secs(30)));
        assert_eq!(config.workload.kind, WorkloadKind::Noop);
        assert!((config.workload.failure_rate - 0.25).abs() < f64::EPSILON);
        assert!(!config.output.progress);
        // Defaults should still apply
        assert_eq!(config.run.iterations, 1_000);
        assert_eq!(config.workload.latency, "1ms");
        assert_eq!(config.output.format, "human");
    }

    #[test]
    fn test_default_toml_parses() {
        let config: LaneConfig = toml::from_str(&LaneConfig::default_toml()).unwrap();
        assert_eq!(config.run.mode, RunMode::Blocking);
        assert_eq!(config.run.iterations, 1_000);
        assert!(config.timeout().unwrap().is_none());
        assert!(config.output.progress);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("lanebench-{}.toml", std::process::id()));
        std::fs::write(&path, "[run]\nlanes = 3\n").unwrap();
        let config = LaneConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.run.lanes, 3);
    }
}
