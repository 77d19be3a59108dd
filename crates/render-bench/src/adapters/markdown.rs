//! HTML to Markdown backend
//!
//! Converts the workload in-process with `html-to-markdown-rs`.

use crate::adapter::RenderBackend;
use crate::adapters::run_blocking;
use crate::workload::Workload;
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::Path;

const NAME: &str = "html-to-markdown";

/// Convert workload markup to Markdown text
pub(crate) fn workload_to_markdown(backend: &str, workload: &Workload) -> Result<String> {
    html_to_markdown_rs::convert(workload.markup(), None)
        .map_err(|e| Error::render(backend, format!("HTML conversion failed: {}", e)))
}

/// Markdown backend using html-to-markdown-rs
pub struct MarkdownAdapter;

impl MarkdownAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarkdownAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RenderBackend for MarkdownAdapter {
    fn name(&self) -> &str {
        NAME
    }

    fn extension(&self) -> &str {
        "md"
    }

    fn version(&self) -> String {
        "html-to-markdown-rs 2".to_string()
    }

    async fn render(&self, workload: &Workload, destination: &Path) -> Result<()> {
        let workload = workload.clone();
        let markdown = run_blocking(NAME, move || workload_to_markdown(NAME, &workload)).await?;
        tokio::fs::write(destination, markdown).await?;
        Ok(())
    }
}
