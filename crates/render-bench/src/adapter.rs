//! Backend contract shared by every renderer under comparison

use crate::Result;
use crate::workload::Workload;
use async_trait::async_trait;
use std::path::Path;

/// A document rendering backend
///
/// Implementations wrap one external rendering capability. `render` writes
/// exactly one artifact to `destination` on success; on failure the artifact
/// may be partial or missing and the caller does not clean it up.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Unique backend name (kebab-case, used for the output subdirectory)
    fn name(&self) -> &str;

    /// File extension of produced artifacts, without the dot
    fn extension(&self) -> &str {
        "pdf"
    }

    /// Version of the underlying renderer
    fn version(&self) -> String;

    /// Render `workload` into `destination`
    async fn render(&self, workload: &Workload, destination: &Path) -> Result<()>;

    /// Prepare the backend before its first iteration
    async fn setup(&self) -> Result<()> {
        Ok(())
    }

    /// Release backend resources after its last iteration
    async fn teardown(&self) -> Result<()> {
        Ok(())
    }
}
