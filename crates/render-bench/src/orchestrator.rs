//! Benchmark orchestrator
//!
//! Drives every registered backend through the measurement runner, one after
//! another in registration order, and collects a summary per backend.

use crate::adapter::RenderBackend;
use crate::registry::BackendRegistry;
use crate::runner::MeasurementRunner;
use crate::stats::{BackendSummary, EmptyResult, summarize};
use crate::workload::Workload;
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinError;

/// Summaries of one benchmark invocation, in registration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResults {
    pub workload: String,
    pub iterations: usize,
    pub backends: IndexMap<String, BackendSummary>,
}

impl BenchmarkResults {
    pub fn get(&self, backend: &str) -> Option<&BackendSummary> {
        self.backends.get(backend)
    }
}

/// Create `dir` and any missing parents; an existing directory is left untouched
pub async fn ensure_output_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}

/// Output directory for `backend` below `root`
pub fn backend_output_dir(root: &Path, backend: &str) -> PathBuf {
    root.join(backend.to_lowercase())
}

/// Runs all registered backends against one workload
pub struct BenchmarkOrchestrator {
    registry: BackendRegistry,
    runner: MeasurementRunner,
    output_root: PathBuf,
}

impl BenchmarkOrchestrator {
    pub fn new(registry: BackendRegistry, runner: MeasurementRunner, output_root: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            runner,
            output_root: output_root.into(),
        }
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Benchmark every backend with `iterations` renders of `workload`
    ///
    /// Backends that were not attempted at all (zero iterations) are left out
    /// of the results. A backend whose output directory or setup fails is
    /// reported as an infrastructure failure and the others still run.
    ///
    /// # Errors
    ///
    /// Only fails when the root output directory cannot be created.
    pub async fn run_all(&self, workload: Arc<Workload>, iterations: usize) -> Result<BenchmarkResults> {
        ensure_output_dir(&self.output_root).await?;

        let mut backends = IndexMap::new();

        for (name, backend) in self.registry.iter() {
            tracing::info!(backend = name, iterations, "Benchmarking {}", name);

            let dir = backend_output_dir(&self.output_root, name);

            if let Err(e) = prepare(backend, &dir).await {
                tracing::error!(backend = name, "Skipping backend: {}", e);
                backends.insert(
                    name.to_string(),
                    BackendSummary::Empty(EmptyResult::infrastructure(e.to_string())),
                );
                continue;
            }

            let extension = backend.extension().to_string();
            let bucket = self
                .runner
                .run(Arc::clone(backend), Arc::clone(&workload), iterations, |i| {
                    dir.join(format!("render_{i}.{extension}"))
                })
                .await;

            match spawn_hook(backend, Hook::Teardown).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(backend = name, "Teardown failed: {}", e),
                Err(e) if e.is_panic() => tracing::warn!(backend = name, "Teardown panicked"),
                Err(e) => tracing::warn!(backend = name, "Teardown task failed: {}", e),
            }

            tracing::info!(
                backend = name,
                successes = bucket.success_count(),
                failures = bucket.failure_count(),
                "Finished {}",
                name
            );

            if bucket.attempts() == 0 {
                continue;
            }

            backends.insert(name.to_string(), summarize(&bucket));
        }

        Ok(BenchmarkResults {
            workload: workload.name().to_string(),
            iterations,
            backends,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Hook {
    Setup,
    Teardown,
}

/// Run a lifecycle hook in its own task so a panic stays inside that backend
async fn spawn_hook(
    backend: &Arc<dyn RenderBackend>,
    hook: Hook,
) -> std::result::Result<Result<()>, JoinError> {
    let backend = Arc::clone(backend);
    tokio::spawn(async move {
        match hook {
            Hook::Setup => backend.setup().await,
            Hook::Teardown => backend.teardown().await,
        }
    })
    .await
}

/// Create the backend's output directory and run its setup hook
async fn prepare(backend: &Arc<dyn RenderBackend>, dir: &Path) -> Result<()> {
    let name = backend.name().to_string();

    ensure_output_dir(dir).await.map_err(|e| Error::Setup {
        backend: name.clone(),
        message: format!("cannot create {}: {}", dir.display(), e),
    })?;

    match spawn_hook(backend, Hook::Setup).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e @ Error::Setup { .. })) => Err(e),
        Ok(Err(other)) => Err(Error::Setup {
            backend: name,
            message: other.to_string(),
        }),
        Err(join_err) if join_err.is_panic() => Err(Error::Setup {
            backend: name,
            message: "setup panicked".to_string(),
        }),
        Err(join_err) => Err(Error::Setup {
            backend: name,
            message: format!("setup task failed: {}", join_err),
        }),
    }
}
