//! Measurement runner: executes one backend N times and records each run
//!
//! Per iteration the runner snapshots memory, reads the monotonic clock,
//! awaits the render, then reads the clock and memory again. Iterations are
//! strictly sequential: the render is spawned as its own task only so that a
//! panic is contained and a timed-out render can be aborted, and the runner
//! waits for that task to finish before the next iteration starts.

use crate::adapter::RenderBackend;
use crate::clock::{Clock, MonotonicClock};
use crate::memory::{MemoryProbe, ProcessMemoryProbe};
use crate::types::{FailureKind, ResultBucket, RunSample};
use crate::workload::Workload;
use crate::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;

/// Default bound on a single render call
pub const DEFAULT_ITERATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs a backend repeatedly and measures each render
pub struct MeasurementRunner {
    clock: Arc<dyn Clock>,
    memory: Arc<dyn MemoryProbe>,
    timeout: Duration,
}

impl MeasurementRunner {
    /// Create a runner using the process clock and process memory counters
    pub fn new(timeout: Duration) -> Self {
        Self {
            clock: Arc::new(MonotonicClock::new()),
            memory: Arc::new(ProcessMemoryProbe::new()),
            timeout,
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the memory counters
    pub fn with_memory_probe(mut self, memory: Arc<dyn MemoryProbe>) -> Self {
        self.memory = memory;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `backend` for `iterations` rounds
    ///
    /// `destination` maps the 1-based iteration number to the artifact path.
    /// Failures never abort the loop; the returned bucket always satisfies
    /// `attempts() == iterations`.
    pub async fn run<F>(
        &self,
        backend: Arc<dyn RenderBackend>,
        workload: Arc<Workload>,
        iterations: usize,
        mut destination: F,
    ) -> ResultBucket
    where
        F: FnMut(usize) -> PathBuf,
    {
        let mut bucket = ResultBucket::new();

        for iteration in 1..=iterations {
            let path = destination(iteration);
            let sample = self
                .measure_once(Arc::clone(&backend), Arc::clone(&workload), iteration, path)
                .await;

            if sample.is_success() {
                tracing::debug!(backend = backend.name(), iteration, "render succeeded");
            }
            bucket.record(sample);
        }

        bucket
    }

    async fn measure_once(
        &self,
        backend: Arc<dyn RenderBackend>,
        workload: Arc<Workload>,
        iteration: usize,
        path: PathBuf,
    ) -> RunSample {
        let name = backend.name().to_string();

        let memory_before = self.memory.snapshot();
        let start = self.clock.now();

        let mut handle = tokio::spawn(async move { backend.render(&workload, &path).await });

        let rendered = match tokio::time::timeout(self.timeout, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                // Wait for the cancellation so nothing of this render overlaps the next one.
                let _ = handle.await;
                let err = Error::Timeout(self.timeout);
                tracing::warn!(backend = %name, iteration, "{}", err);
                return RunSample::failure(iteration, FailureKind::Timeout, err.to_string());
            }
        };

        match flatten_join(&name, rendered) {
            Ok(()) => {
                let end = self.clock.now();
                let memory_after = self.memory.snapshot();

                match elapsed(start, end) {
                    Ok(duration) => RunSample::success(
                        iteration,
                        duration.as_secs_f64() * 1000.0,
                        memory_after.delta_since(&memory_before),
                    ),
                    Err(err) => {
                        tracing::error!(
                            backend = %name,
                            iteration,
                            "measurement apparatus is broken, sample discarded: {}",
                            err
                        );
                        RunSample::failure(iteration, FailureKind::ClockViolation, err.to_string())
                    }
                }
            }
            Err((kind, err)) => {
                tracing::warn!(backend = %name, iteration, "{}", err);
                RunSample::failure(iteration, kind, err.to_string())
            }
        }
    }
}

impl Default for MeasurementRunner {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATION_TIMEOUT)
    }
}

/// `end - start`, or [`Error::ClockViolation`] if the clock went backwards
pub fn elapsed(start: Duration, end: Duration) -> Result<Duration> {
    end.checked_sub(start).ok_or(Error::ClockViolation { start, end })
}

fn flatten_join(
    backend: &str,
    joined: std::result::Result<Result<()>, JoinError>,
) -> std::result::Result<(), (FailureKind, Error)> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err((FailureKind::Render, err)),
        Err(join_err) if join_err.is_panic() => {
            Err((FailureKind::Panic, Error::render(backend, "render task panicked")))
        }
        Err(join_err) => Err((FailureKind::Panic, Error::render(backend, join_err))),
    }
}
