//! Error types for the benchmark harness

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for benchmark harness operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during benchmark operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be parsed
    #[error("Invalid TOML in {path}: {message}")]
    Toml { path: PathBuf, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workload file missing or unreadable
    #[error("Workload not found: {0}")]
    WorkloadNotFound(PathBuf),

    /// A backend's render call reported an error
    #[error("Backend '{backend}' failed to render: {message}")]
    Render { backend: String, message: String },

    /// Render did not finish within the iteration timeout
    #[error("Timeout: render exceeded {0:?}")]
    Timeout(Duration),

    /// The monotonic clock went backwards between two readings
    #[error("Clock violation: end {end:?} precedes start {start:?}")]
    ClockViolation { start: Duration, end: Duration },

    /// Backend could not be prepared (missing tool, unwritable directory)
    #[error("Setup of backend '{backend}' failed: {message}")]
    Setup { backend: String, message: String },

    /// Requested backend is not registered
    #[error("Backend '{0}' is not registered")]
    BackendNotFound(String),

    /// Registry rejected a backend
    #[error("Registration error: {0}")]
    Registration(String),

    /// Report template failed to render
    #[error("Report rendering error: {0}")]
    Report(#[from] minijinja::Error),
}

impl Error {
    /// Shorthand for a render failure attributed to `backend`
    pub fn render(backend: impl Into<String>, message: impl ToString) -> Self {
        Error::Render {
            backend: backend.into(),
            message: message.to_string(),
        }
    }
}
