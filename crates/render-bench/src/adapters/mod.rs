//! Rendering backends
//!
//! In-process backends call a Rust rendering library directly; subprocess
//! backends drive an external renderer found on `PATH`.

pub mod external;
pub mod markdown;
pub mod pdf;
pub mod subprocess;

pub use markdown::MarkdownAdapter;
pub use pdf::LopdfAdapter;
pub use subprocess::SubprocessAdapter;

use crate::registry::BackendRegistry;
use crate::{Error, Result};
use std::sync::Arc;

/// Run synchronous rendering work on the blocking pool
///
/// Keeps the runtime free so the iteration timeout can fire while the work is
/// in progress. The work itself cannot be interrupted and runs to completion
/// in the background after a timeout. A panic is re-raised in the caller.
pub(crate) async fn run_blocking<T, F>(backend: &str, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(Error::render(backend, e)),
    }
}

/// Registry with every built-in backend in its fixed run order
///
/// Subprocess backends are always registered; a missing executable shows up
/// as an infrastructure failure for that backend when it is set up.
pub fn default_registry() -> Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();

    registry.register(Arc::new(LopdfAdapter::new()))?;
    registry.register(Arc::new(MarkdownAdapter::new()))?;
    registry.register(Arc::new(external::create_wkhtmltopdf_adapter()))?;
    registry.register(Arc::new(external::create_weasyprint_adapter()))?;
    registry.register(Arc::new(external::create_chromium_adapter()))?;
    registry.register(Arc::new(external::create_pandoc_adapter()))?;

    Ok(registry)
}
