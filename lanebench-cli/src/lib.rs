#![warn(missing_docs)]
//! LaneBench CLI Library
//!
//! Command-line driver for the lane runners: loads `lanebench.toml`, applies
//! flag overrides, runs a synthetic workload under the blocking or async
//! runner and renders the report.
//!
//! # Example
//!
//! ```ignore
//! fn main() -> anyhow::Result<()> {
//!     lanebench_cli::run()
//! }
//! ```

mod config;
mod executor;
mod workload;

pub use config::*;
pub use executor::{
    ExecutionConfig, FailureRecord, OutputFormat, Report, ReportMeta, build_report, execute,
    format_human_output, generate_json_report,
};
pub use workload::{Workload, WorkloadError};

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// LaneBench CLI arguments
#[derive(Parser, Debug, Default)]
#[command(name = "lanebench")]
#[command(author, version, about = "LaneBench - concurrent load benchmark harness")]
pub struct Cli {
    /// Optional subcommand (Run, Init); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (default: discover lanebench.toml)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Runner: blocking or async
    #[arg(long, value_enum)]
    pub mode: Option<RunMode>,

    /// Total iterations, split evenly over the lanes
    #[arg(long, short = 'i')]
    pub iterations: Option<usize>,

    /// Number of parallel lanes
    #[arg(long, short = 'l')]
    pub lanes: Option<usize>,

    /// Bound on the wait for all lanes (e.g., "30s")
    #[arg(long)]
    pub timeout: Option<String>,

    /// Pin blocking lanes to CPU cores
    #[arg(long)]
    pub pin_lanes: bool,

    /// Async runtime worker threads
    #[arg(long)]
    pub worker_threads: Option<usize>,

    /// Workload kind: noop, sleep or spin
    #[arg(long, value_enum)]
    pub workload: Option<WorkloadKind>,

    /// Base latency per iteration (e.g., "2ms")
    #[arg(long)]
    pub latency: Option<String>,

    /// Uniform jitter around the base latency (e.g., "200us")
    #[arg(long)]
    pub jitter: Option<String>,

    /// Probability in [0, 1] that an iteration fails
    #[arg(long)]
    pub failure_rate: Option<f64>,

    /// Output format: human, json
    #[arg(long)]
    pub format: Option<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not draw the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the benchmark (default)
    Run,
    /// Print a default lanebench.toml
    Init {
        /// Write lanebench.toml into the current directory instead of printing it
        #[arg(long)]
        write: bool,
    },
}

/// Run the LaneBench CLI with the process arguments.
/// This is the main entry point of the `lanebench` binary.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the LaneBench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Init { write }) => init_config(write),
        Some(Commands::Run) | None => {
            let mut config = match cli.config {
                Some(ref path) => LaneConfig::load(path)?,
                None => LaneConfig::discover().unwrap_or_default(),
            };
            apply_overrides(&cli, &mut config);
            run_benchmark(&config)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "lanebench_core=debug,lanebench_cli=debug"
    } else {
        "lanebench_core=info,lanebench_cli=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Reports go to stdout; keep logs out of them
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn init_config(write: bool) -> anyhow::Result<()> {
    let content = LaneConfig::default_toml();
    if !write {
        print!("{}", content);
        return Ok(());
    }

    let path = PathBuf::from(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(anyhow::anyhow!("{} already exists", path.display()));
    }
    std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}

/// Layer command-line flags over the file configuration
pub fn apply_overrides(cli: &Cli, config: &mut LaneConfig) {
    if let Some(mode) = cli.mode {
        config.run.mode = mode;
    }
    if let Some(iterations) = cli.iterations {
        config.run.iterations = iterations;
    }
    if let Some(lanes) = cli.lanes {
        config.run.lanes = lanes;
    }
    if let Some(ref timeout) = cli.timeout {
        config.run.timeout = Some(timeout.clone());
    }
    if cli.pin_lanes {
        config.run.pin_lanes = true;
    }
    if let Some(threads) = cli.worker_threads {
        config.run.worker_threads = Some(threads);
    }
    if let Some(kind) = cli.workload {
        config.workload.kind = kind;
    }
    if let Some(ref latency) = cli.latency {
        config.workload.latency = latency.clone();
    }
    if let Some(ref jitter) = cli.jitter {
        config.workload.jitter = jitter.clone();
    }
    if let Some(rate) = cli.failure_rate {
        config.workload.failure_rate = rate;
    }
    if let Some(ref format) = cli.format {
        config.output.format = format.clone();
    }
    if let Some(ref output) = cli.output {
        config.output.path = Some(output.display().to_string());
    }
    if cli.no_progress {
        config.output.progress = false;
    }
}

fn run_benchmark(config: &LaneConfig) -> anyhow::Result<()> {
    let format: OutputFormat = config
        .output
        .format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let exec_config = ExecutionConfig::from_config(config)?;
    let workload = Workload::from_config(&config.workload)?;

    let dropped = config.run.iterations % config.run.lanes;
    if dropped > 0 {
        tracing::warn!(
            iterations = config.run.iterations,
            lanes = config.run.lanes,
            dropped,
            "iterations not divisible by lanes, remainder dropped"
        );
    }

    eprintln!(
        "Lanes: {}, Iterations per lane: {}, Mode: {}, Workload: {}",
        exec_config.spec.lanes(),
        exec_config.spec.iterations_per_lane(),
        exec_config.mode,
        workload.describe()
    );

    let outcome = execute(&exec_config, &workload)?;
    let report = build_report(&exec_config, &workload, &outcome);

    let output = match format {
        OutputFormat::Json => generate_json_report(&report)?,
        OutputFormat::Human => format_human_output(&report),
    };

    if let Some(ref path) = config.output.path {
        let mut file =
            std::fs::File::create(path).with_context(|| format!("creating {}", path))?;
        file.write_all(output.as_bytes())?;
        eprintln!("Report written to: {}", path);
    } else {
        print!("{}", output);
    }

    // Exit with appropriate code
    if !outcome.statistics.is_clean() {
        if outcome.statistics.failed_samples > 0 || !outcome.failures.is_empty() {
            eprintln!("\n{} iteration(s) failed", outcome.failures.len());
        }
        if outcome.statistics.unwritten_samples > 0 {
            eprintln!(
                "{} sample(s) were never written",
                outcome.statistics.unwritten_samples
            );
        }
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "lanebench",
            "--mode",
            "async",
            "-i",
            "400",
            "-l",
            "8",
            "--workload",
            "spin",
            "--failure-rate",
            "0.1",
            "--format",
            "json",
        ])
        .unwrap();

        assert!(cli.command.is_none());
        assert_eq!(cli.mode, Some(RunMode::Async));
        assert_eq!(cli.iterations, Some(400));
        assert_eq!(cli.lanes, Some(8));
        assert_eq!(cli.workload, Some(WorkloadKind::Spin));
        assert_eq!(cli.failure_rate, Some(0.1));
    }

    #[test]
    fn test_cli_subcommands() {
        let cli = Cli::try_parse_from(["lanebench", "init", "--write"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Init { write: true })));

        let cli = Cli::try_parse_from(["lanebench", "run"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Run)));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut config: LaneConfig = toml::from_str(
            r#"
            [run]
            mode = "blocking"
            iterations = 100
            lanes = 2
            timeout = "10s"

            [workload]
            kind = "sleep"
            latency = "5ms"
            "#,
        )
        .unwrap();

        let cli = Cli {
            mode: Some(RunMode::Async),
            lanes: Some(4),
            latency: Some("1ms".to_string()),
            output: Some(PathBuf::from("out.json")),
            ..Cli::default()
        };
        apply_overrides(&cli, &mut config);

        assert_eq!(config.run.mode, RunMode::Async);
        assert_eq!(config.run.lanes, 4);
        assert_eq!(config.workload.latency, "1ms");
        assert_eq!(config.output.path.as_deref(), Some("out.json"));
        // Untouched values come from the file
        assert_eq!(config.run.iterations, 100);
        assert_eq!(config.run.timeout.as_deref(), Some("10s"));
        assert_eq!(config.workload.kind, WorkloadKind::Sleep);
    }

    #[test]
    fn test_no_progress_flag() {
        let cli = Cli::try_parse_from(["lanebench", "--no-progress"]).unwrap();
        let mut config = LaneConfig::default();
        apply_overrides(&cli, &mut config);
        assert!(!config.output.progress);
        assert!(!ExecutionConfig::from_config(&config).unwrap().show_progress);

        let mut config: LaneConfig = toml::from_str("[output]\nprogress = false\n").unwrap();
        apply_overrides(&Cli::default(), &mut config);
        assert!(!config.output.progress);
    }

    #[test]
    fn test_no_flags_keep_file_values() {
        let mut config = LaneConfig::default();
        config.run.pin_lanes = true;
        apply_overrides(&Cli::default(), &mut config);
        assert!(config.run.pin_lanes);
        assert_eq!(config.run.lanes, 1);
        assert_eq!(config.output.format, "human");
        assert!(config.output.progress);
    }
}
