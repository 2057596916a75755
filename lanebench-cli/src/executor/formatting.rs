//! Output Formatting
//!
//! Human-readable output for run reports: the run shape, throughput and
//! latency lines, then the failed iterations and unwritten samples.

use super::report::Report;

/// Failures listed individually before the rest are summarized
const MAX_LISTED_FAILURES: usize = 10;

/// Format a report for human-readable terminal display
pub fn format_human_output(report: &Report) -> String {
    let meta = &report.meta;
    let stats = &report.statistics;
    let mut output = String::new();

    output.push('\n');
    output.push_str("LaneBench Results\n");
    output.push_str(&"=".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "Mode: {}, Lanes: {}, Iterations per lane: {}, Workload: {}\n",
        meta.mode,
        group_thousands(meta.lanes as u64),
        group_thousands(meta.iterations_per_lane as u64),
        meta.workload
    ));
    output.push_str(&"-".repeat(60));
    output.push('\n');

    output.push_str(&format!(
        "Iterations: {}, Total time: {} millis ({}/second)\n",
        group_thousands(stats.total_iterations),
        group_thousands(stats.total_elapsed_ms.round() as u64),
        group_thousands(stats.throughput_per_sec.round() as u64)
    ));

    match &stats.latency {
        Some(latency) => output.push_str(&format!(
            "Max: {:.3} millis, Min: {:.3} millis, Average: {:.3} millis\n",
            latency.max_ms, latency.min_ms, latency.mean_ms
        )),
        None => output.push_str("Max: n/a, Min: n/a, Average: n/a (no samples written)\n"),
    }

    if !report.failures.is_empty() {
        output.push('\n');
        output.push_str(&format!(
            "Failed iterations: {}\n",
            group_thousands(report.failures.len() as u64)
        ));
        for failure in report.failures.iter().take(MAX_LISTED_FAILURES) {
            let icon = if failure.panicked { "💥" } else { "✗" };
            output.push_str(&format!(
                "  {} lane {} iteration {}: {}\n",
                icon, failure.lane, failure.iteration, failure.message
            ));
        }
        if report.failures.len() > MAX_LISTED_FAILURES {
            output.push_str(&format!(
                "  ... and {} more\n",
                report.failures.len() - MAX_LISTED_FAILURES
            ));
        }
    }

    if stats.unwritten_samples > 0 {
        output.push_str(&format!(
            "Unwritten samples: {} (lanes ended early)\n",
            group_thousands(stats.unwritten_samples)
        ));
    }

    output
}

/// `1234567` -> `1,234,567`
pub(crate) fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
