//! Human-readable report of benchmark results
//!
//! The report is rendered from a MiniJinja template embedded at compile time.
//! All number formatting happens here so the template only lays out strings.

use crate::Result;
use crate::orchestrator::BenchmarkResults;
use crate::stats::{BackendSummary, EmptyReason};
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};
use std::path::Path;

const SUMMARY_TEMPLATE: &str = include_str!("../templates/summary.txt.jinja");

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Host description printed above the results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub cpu: String,
    pub cores: usize,
    pub total_memory_mb: u64,
}

impl SystemInfo {
    /// Collect host information through sysinfo
    pub fn collect() -> Self {
        let mut system = sysinfo::System::new();
        system.refresh_memory();
        system.refresh_cpu_all();

        let cpu = system
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            os: sysinfo::System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string()),
            cpu,
            cores: system.cpus().len(),
            total_memory_mb: system.total_memory() / (1024 * 1024),
        }
    }
}

#[derive(Debug, Serialize)]
struct BackendView {
    name: String,
    status: &'static str,
    success_rate: String,
    avg_ms: String,
    heap_mb: String,
    native_mb: String,
    p50_ms: Option<String>,
    p90_ms: Option<String>,
    cause: Option<String>,
    failures: usize,
    attempts: usize,
}

impl BackendView {
    fn new(name: &str, summary: &BackendSummary) -> Self {
        match summary {
            BackendSummary::Stats(stats) => {
                let distribution = stats.successes > 1;
                Self {
                    name: name.to_string(),
                    status: "stats",
                    success_rate: format!("{:.2}", stats.success_rate * 100.0),
                    avg_ms: format!("{:.2}", stats.mean_duration_ms),
                    heap_mb: format!("{:.2}", stats.mean_heap_delta_bytes / BYTES_PER_MB),
                    native_mb: format!("{:.2}", stats.mean_native_delta_bytes / BYTES_PER_MB),
                    p50_ms: distribution.then(|| format!("{:.2}", stats.p50_duration_ms)),
                    p90_ms: distribution.then(|| format!("{:.2}", stats.p90_duration_ms)),
                    cause: None,
                    failures: stats.failures,
                    attempts: stats.successes + stats.failures,
                }
            }
            BackendSummary::Empty(empty) => Self {
                name: name.to_string(),
                status: "empty",
                success_rate: "0.00".to_string(),
                avg_ms: String::new(),
                heap_mb: String::new(),
                native_mb: String::new(),
                p50_ms: None,
                p90_ms: None,
                cause: match &empty.reason {
                    EmptyReason::InfrastructureFailure { cause } => Some(cause.clone()),
                    EmptyReason::NoSuccessfulSamples => None,
                },
                failures: empty.failures,
                attempts: empty.attempts,
            },
        }
    }
}

/// Render the console report
pub fn render_text(results: &BenchmarkResults, system: &SystemInfo, output_root: &Path) -> Result<String> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template("summary.txt", SUMMARY_TEMPLATE)?;

    let backends: Vec<BackendView> = results
        .backends
        .iter()
        .map(|(name, summary)| BackendView::new(name, summary))
        .collect();

    let rendered = env.get_template("summary.txt")?.render(context! {
        system => system,
        workload => &results.workload,
        iterations => results.iterations,
        backends => backends,
        output_root => output_root.display().to_string(),
    })?;

    Ok(rendered)
}
