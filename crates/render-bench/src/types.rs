//! Measurement records produced by the runner

use serde::{Deserialize, Serialize};

/// Signed change in memory counters across one render call
///
/// Either field may be negative when memory was released during the call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryDelta {
    pub heap_bytes: i64,
    pub native_bytes: i64,
}

/// Why an iteration did not produce a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// The backend returned an error
    Render,
    /// The render call exceeded the iteration timeout
    Timeout,
    /// The backend panicked or its task was cancelled
    Panic,
    /// The measured duration was negative
    ClockViolation,
}

/// Result of one iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Outcome {
    Success { duration_ms: f64, memory: MemoryDelta },
    Failure { kind: FailureKind, message: String },
}

/// One timed, memory-measured execution attempt of a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSample {
    /// 1-based iteration number
    pub iteration: usize,
    pub outcome: Outcome,
}

impl RunSample {
    pub fn success(iteration: usize, duration_ms: f64, memory: MemoryDelta) -> Self {
        Self {
            iteration,
            outcome: Outcome::Success { duration_ms, memory },
        }
    }

    pub fn failure(iteration: usize, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            iteration,
            outcome: Outcome::Failure {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }
}

/// A failed iteration as kept in the bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub iteration: usize,
    pub kind: FailureKind,
    pub message: String,
}

/// Per-backend accumulation of samples for one benchmark invocation
///
/// Durations and memory deltas are kept in iteration order and only for
/// successful iterations; failures are kept separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultBucket {
    durations_ms: Vec<f64>,
    memory_deltas: Vec<MemoryDelta>,
    failures: Vec<FailureRecord>,
}

impl ResultBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample
    pub fn record(&mut self, sample: RunSample) {
        match sample.outcome {
            Outcome::Success { duration_ms, memory } => {
                self.durations_ms.push(duration_ms);
                self.memory_deltas.push(memory);
            }
            Outcome::Failure { kind, message } => self.failures.push(FailureRecord {
                iteration: sample.iteration,
                kind,
                message,
            }),
        }
    }

    pub fn durations_ms(&self) -> &[f64] {
        &self.durations_ms
    }

    pub fn memory_deltas(&self) -> &[MemoryDelta] {
        &self.memory_deltas
    }

    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    pub fn success_count(&self) -> usize {
        self.durations_ms.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Failures of one particular kind
    pub fn failure_count_of(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }

    /// successes + failures
    pub fn attempts(&self) -> usize {
        self.success_count() + self.failure_count()
    }
}
