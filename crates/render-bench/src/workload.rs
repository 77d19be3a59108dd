//! The document every backend renders.
//!
//! A workload is opaque to the harness: it is HTML markup with inline style
//! rules, handed by shared reference to each backend. Only backends look inside.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const SAMPLE_DOCUMENT: &str = include_str!("../assets/sample.html");

/// A fixed document description shared by all backends in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    name: String,
    markup: String,
}

impl Workload {
    pub fn new(name: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            markup: markup.into(),
        }
    }

    /// Built-in sample document used when no workload file is configured
    pub fn sample() -> Self {
        Self::new("sample", SAMPLE_DOCUMENT)
    }

    /// Load a workload from an HTML file; the file stem becomes its name
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(Error::WorkloadNotFound(path.to_path_buf()));
        }

        let markup = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "workload".to_string());

        Ok(Self::new(name, markup))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Size of the markup in bytes
    pub fn size_bytes(&self) -> usize {
        self.markup.len()
    }
}
