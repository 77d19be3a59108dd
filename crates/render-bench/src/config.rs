//! Benchmark configuration
//!
//! Configuration is read from `render-bench.toml` (discovered in the current
//! directory or any parent) and then overridden by command-line flags.
//!
//! ```toml
//! iterations = 5
//! timeout_secs = 60
//! output_dir = "output"
//! backends = ["lopdf", "wkhtmltopdf"]
//! workload = "docs/report.html"
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up by [`BenchmarkConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "render-bench.toml";

/// Configuration for benchmark runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Number of measured render calls per backend
    pub iterations: usize,

    /// Upper bound on a single render call, in seconds
    pub timeout_secs: u64,

    /// Root directory; each backend gets its own subdirectory
    pub output_dir: PathBuf,

    /// Backends to run (None = all registered, in registration order)
    pub backends: Option<Vec<String>>,

    /// HTML workload file (None = built-in sample document)
    pub workload: Option<PathBuf>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            iterations: 3,
            timeout_secs: 120,
            output_dir: PathBuf::from("output"),
            backends: None,
            workload: None,
        }
    }
}

/// Command-line values layered over the file configuration
///
/// `None` (or an empty backend list) keeps the configured value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub iterations: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub backends: Vec<String>,
    pub workload: Option<PathBuf>,
}

impl BenchmarkConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read and [`Error::Toml`]
    /// if it is not valid TOML for this schema.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;

        toml::from_str(&content).map_err(|e| Error::Toml {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Discover configuration file in parent directories.
    ///
    /// Searches for `render-bench.toml` starting at `start` and walking up.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover_from(start: impl AsRef<Path>) -> Result<Option<Self>> {
        let mut current = Some(start.as_ref());

        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                tracing::debug!("Using configuration {}", candidate.display());
                return Ok(Some(Self::from_toml_file(candidate)?));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Discover configuration starting at the current working directory
    pub fn discover() -> Result<Option<Self>> {
        let cwd = std::env::current_dir()?;
        Self::discover_from(cwd)
    }

    /// Replace configured values with those given on the command line
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(iterations) = overrides.iterations {
            self.iterations = iterations;
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        if let Some(output_dir) = overrides.output_dir {
            self.output_dir = output_dir;
        }
        if !overrides.backends.is_empty() {
            self.backends = Some(overrides.backends);
        }
        if overrides.workload.is_some() {
            self.workload = overrides.workload;
        }
    }

    /// Per-iteration timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any configuration value is invalid
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::Config("iterations must be > 0".to_string()));
        }

        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be > 0".to_string()));
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(Error::Config("output_dir cannot be empty".to_string()));
        }

        if let Some(backends) = &self.backends
            && backends.iter().any(|name| name.trim().is_empty())
        {
            return Err(Error::Config("backend names cannot be empty".to_string()));
        }

        Ok(())
    }
}
