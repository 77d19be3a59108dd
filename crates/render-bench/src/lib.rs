//! Benchmark harness for comparing document rendering backends
//!
//! Every registered backend renders the same HTML workload a fixed number of
//! times, one iteration after another. Each iteration records its wall-clock
//! duration and the signed change in heap and native memory; failed renders
//! are counted rather than aborting the run. Per-backend samples are reduced
//! to means, nearest-rank percentiles and a success rate, or to an explicit
//! empty result when a backend produced no successful sample.
//!
//! ```rust,no_run
//! use render_bench::{BenchmarkOrchestrator, MeasurementRunner, Workload, adapters};
//! use std::sync::Arc;
//!
//! # async fn example() -> render_bench::Result<()> {
//! let registry = adapters::default_registry()?;
//! let orchestrator = BenchmarkOrchestrator::new(registry, MeasurementRunner::default(), "output");
//! let results = orchestrator.run_all(Arc::new(Workload::sample()), 3).await?;
//! println!("{} backends measured", results.backends.len());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod adapters;
pub mod clock;
pub mod config;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod output;
pub mod registry;
pub mod report;
pub mod runner;
pub mod stats;
pub mod types;
pub mod workload;

pub use adapter::RenderBackend;
pub use adapters::{LopdfAdapter, MarkdownAdapter, SubprocessAdapter};
pub use clock::{Clock, MonotonicClock};
pub use config::BenchmarkConfig;
pub use error::{Error, Result};
pub use memory::{MemoryProbe, MemorySnapshot, ProcessMemoryProbe, TrackingAllocator};
pub use orchestrator::{BenchmarkOrchestrator, BenchmarkResults};
pub use output::write_json;
pub use registry::BackendRegistry;
pub use report::{SystemInfo, render_text};
pub use runner::MeasurementRunner;
pub use stats::{BackendSummary, EmptyReason, EmptyResult, SummaryStats, summarize};
pub use types::{FailureKind, MemoryDelta, ResultBucket, RunSample};
pub use workload::Workload;
