//! Output writers for benchmark results
//!
//! Results are persisted as a single pretty-printed JSON document next to the
//! per-backend artifact directories.

use crate::Result;
use crate::orchestrator::BenchmarkResults;
use crate::report::SystemInfo;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File name of the JSON results inside the output directory
pub const RESULTS_FILE_NAME: &str = "results.json";

/// On-disk layout of a results file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsDocument {
    /// RFC 3339 timestamp of when the file was written
    pub generated_at: String,
    pub system: SystemInfo,
    pub results: BenchmarkResults,
}

/// Write benchmark results to a JSON file
///
/// # Arguments
/// * `results` - Summaries of one benchmark invocation
/// * `system` - Host description recorded alongside the results
/// * `output_path` - Path to output JSON file; parent directories are created
pub fn write_json(results: &BenchmarkResults, system: &SystemInfo, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let document = ResultsDocument {
        generated_at: chrono::Utc::now().to_rfc3339(),
        system: system.clone(),
        results: results.clone(),
    };

    let json = serde_json::to_string_pretty(&document)?;
    fs::write(output_path, json)?;

    tracing::info!("Results written to {}", output_path.display());
    Ok(())
}
