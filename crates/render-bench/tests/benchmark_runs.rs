//! End-to-end runs of the orchestrator with in-test backends

use async_trait::async_trait;
use render_bench::{
    BackendRegistry, BackendSummary, BenchmarkOrchestrator, Clock, EmptyReason, Error, MeasurementRunner,
    MemoryProbe, MemorySnapshot, RenderBackend, Result, Workload,
};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Advances by a fixed step on every reading
struct StepClock {
    step: Duration,
    ticks: AtomicU64,
}

impl StepClock {
    fn new(step: Duration) -> Self {
        Self {
            step,
            ticks: AtomicU64::new(0),
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> Duration {
        self.step * self.ticks.fetch_add(1, Ordering::SeqCst) as u32
    }
}

struct ZeroProbe;

impl MemoryProbe for ZeroProbe {
    fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot::default()
    }
}

/// Writes the workload to the destination
struct WritingBackend {
    name: &'static str,
}

#[async_trait]
impl RenderBackend for WritingBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn extension(&self) -> &str {
        "html"
    }

    fn version(&self) -> String {
        "test".to_string()
    }

    async fn render(&self, workload: &Workload, destination: &Path) -> Result<()> {
        tokio::fs::write(destination, workload.markup()).await?;
        Ok(())
    }
}

struct FailingBackend;

#[async_trait]
impl RenderBackend for FailingBackend {
    fn name(&self) -> &str {
        "always-fails"
    }

    fn version(&self) -> String {
        "test".to_string()
    }

    async fn render(&self, _workload: &Workload, _destination: &Path) -> Result<()> {
        Err(Error::render("always-fails", "renderer rejected the document"))
    }
}

/// Setup reports a missing tool; render must never be called
struct UnavailableBackend {
    renders: AtomicUsize,
}

#[async_trait]
impl RenderBackend for UnavailableBackend {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn version(&self) -> String {
        "test".to_string()
    }

    async fn render(&self, _workload: &Workload, _destination: &Path) -> Result<()> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn setup(&self) -> Result<()> {
        Err(Error::Setup {
            backend: "unavailable".to_string(),
            message: "Command 'unavailable' not found".to_string(),
        })
    }
}

/// Tracks how many renders overlap across every backend sharing the counters
struct OverlapCounter {
    name: &'static str,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderBackend for OverlapCounter {
    fn name(&self) -> &str {
        self.name
    }

    fn version(&self) -> String {
        "test".to_string()
    }

    async fn render(&self, _workload: &Workload, _destination: &Path) -> Result<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Lifecycle hooks that crash instead of returning an error
struct CrashingHooks {
    name: &'static str,
    crash_in_setup: bool,
}

#[async_trait]
impl RenderBackend for CrashingHooks {
    fn name(&self) -> &str {
        self.name
    }

    fn version(&self) -> String {
        "test".to_string()
    }

    async fn render(&self, _workload: &Workload, _destination: &Path) -> Result<()> {
        Ok(())
    }

    async fn setup(&self) -> Result<()> {
        if self.crash_in_setup {
            panic!("setup blew up");
        }
        Ok(())
    }

    async fn teardown(&self) -> Result<()> {
        panic!("teardown blew up");
    }
}

struct SlowBackend;

#[async_trait]
impl RenderBackend for SlowBackend {
    fn name(&self) -> &str {
        "slow"
    }

    fn version(&self) -> String {
        "test".to_string()
    }

    async fn render(&self, _workload: &Workload, _destination: &Path) -> Result<()> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

fn deterministic_runner(step_ms: u64) -> MeasurementRunner {
    MeasurementRunner::new(Duration::from_secs(5))
        .with_clock(Arc::new(StepClock::new(Duration::from_millis(step_ms))))
        .with_memory_probe(Arc::new(ZeroProbe))
}

fn workload() -> Arc<Workload> {
    Arc::new(Workload::new("fixture", "<h1>Invoice</h1><p>Total: 42</p>"))
}

#[tokio::test]
async fn test_success_and_failure_backends_are_summarized_separately() {
    let temp = TempDir::new().unwrap();
    let mut registry = BackendRegistry::new();
    registry.register(Arc::new(WritingBackend { name: "always-works" })).unwrap();
    registry.register(Arc::new(FailingBackend)).unwrap();

    let orchestrator = BenchmarkOrchestrator::new(registry, deterministic_runner(50), temp.path());
    let results = orchestrator.run_all(workload(), 3).await.unwrap();

    let names: Vec<&String> = results.backends.keys().collect();
    assert_eq!(names, vec!["always-works", "always-fails"]);

    let stats = results.get("always-works").and_then(BackendSummary::stats).unwrap();
    assert_eq!(stats.successes, 3);
    assert_eq!(stats.failures, 0);
    assert_eq!(stats.success_rate, 1.0);
    assert_eq!(stats.mean_duration_ms, 50.0);
    assert_eq!(stats.p50_duration_ms, 50.0);
    assert_eq!(stats.p90_duration_ms, 50.0);

    let empty = results.get("always-fails").and_then(BackendSummary::empty).unwrap();
    assert_eq!(empty.reason, EmptyReason::NoSuccessfulSamples);
    assert_eq!(empty.attempts, 3);
    assert_eq!(empty.failures, 3);
}

#[tokio::test]
async fn test_artifacts_land_in_lowercased_backend_directories() {
    let temp = TempDir::new().unwrap();
    let mut registry = BackendRegistry::new();
    registry.register(Arc::new(WritingBackend { name: "Writer" })).unwrap();

    let orchestrator = BenchmarkOrchestrator::new(registry, deterministic_runner(1), temp.path());
    orchestrator.run_all(workload(), 2).await.unwrap();

    let dir = temp.path().join("writer");
    for i in 1..=2 {
        let artifact = dir.join(format!("render_{i}.html"));
        assert_eq!(
            std::fs::read_to_string(&artifact).unwrap(),
            "<h1>Invoice</h1><p>Total: 42</p>"
        );
    }
}

#[tokio::test]
async fn test_setup_failure_is_isolated_to_its_backend() {
    let temp = TempDir::new().unwrap();
    let unavailable = Arc::new(UnavailableBackend {
        renders: AtomicUsize::new(0),
    });

    let mut registry = BackendRegistry::new();
    registry.register(unavailable.clone()).unwrap();
    registry.register(Arc::new(WritingBackend { name: "after" })).unwrap();

    let orchestrator = BenchmarkOrchestrator::new(registry, deterministic_runner(10), temp.path());
    let results = orchestrator.run_all(workload(), 2).await.unwrap();

    assert_eq!(unavailable.renders.load(Ordering::SeqCst), 0);

    let empty = results.get("unavailable").and_then(BackendSummary::empty).unwrap();
    match &empty.reason {
        EmptyReason::InfrastructureFailure { cause } => assert!(cause.contains("not found")),
        other => panic!("expected infrastructure failure, got {:?}", other),
    }

    let stats = results.get("after").and_then(BackendSummary::stats).unwrap();
    assert_eq!(stats.successes, 2);
}

#[tokio::test]
async fn test_setup_panic_is_isolated_to_its_backend() {
    let temp = TempDir::new().unwrap();
    let mut registry = BackendRegistry::new();
    registry
        .register(Arc::new(CrashingHooks {
            name: "crashes-in-setup",
            crash_in_setup: true,
        }))
        .unwrap();
    registry.register(Arc::new(WritingBackend { name: "after" })).unwrap();

    let orchestrator = BenchmarkOrchestrator::new(registry, deterministic_runner(10), temp.path());
    let results = orchestrator.run_all(workload(), 2).await.unwrap();

    let empty = results.get("crashes-in-setup").and_then(BackendSummary::empty).unwrap();
    match &empty.reason {
        EmptyReason::InfrastructureFailure { cause } => assert!(cause.contains("setup panicked")),
        other => panic!("expected infrastructure failure, got {:?}", other),
    }
    assert_eq!(empty.attempts, 0);

    let stats = results.get("after").and_then(BackendSummary::stats).unwrap();
    assert_eq!(stats.successes, 2);
}

#[tokio::test]
async fn test_teardown_panic_keeps_samples_and_later_backends() {
    let temp = TempDir::new().unwrap();
    let mut registry = BackendRegistry::new();
    registry
        .register(Arc::new(CrashingHooks {
            name: "crashes-in-teardown",
            crash_in_setup: false,
        }))
        .unwrap();
    registry.register(Arc::new(WritingBackend { name: "after" })).unwrap();

    let orchestrator = BenchmarkOrchestrator::new(registry, deterministic_runner(10), temp.path());
    let results = orchestrator.run_all(workload(), 2).await.unwrap();

    let crashed = results.get("crashes-in-teardown").and_then(BackendSummary::stats).unwrap();
    assert_eq!(crashed.successes, 2);
    assert!(results.get("after").and_then(BackendSummary::stats).is_some());
}

#[tokio::test]
async fn test_unwritable_backend_directory_is_an_infrastructure_failure() {
    let temp = TempDir::new().unwrap();
    // A regular file where the backend directory should go
    std::fs::write(temp.path().join("blocked"), "occupied").unwrap();

    let mut registry = BackendRegistry::new();
    registry.register(Arc::new(WritingBackend { name: "blocked" })).unwrap();
    registry.register(Arc::new(WritingBackend { name: "free" })).unwrap();

    let orchestrator = BenchmarkOrchestrator::new(registry, deterministic_runner(10), temp.path());
    let results = orchestrator.run_all(workload(), 1).await.unwrap();

    assert!(matches!(
        results.get("blocked").and_then(BackendSummary::empty).map(|e| &e.reason),
        Some(EmptyReason::InfrastructureFailure { .. })
    ));
    assert!(results.get("free").and_then(BackendSummary::stats).is_some());
}

#[tokio::test]
async fn test_renders_never_overlap() {
    let temp = TempDir::new().unwrap();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));

    let mut registry = BackendRegistry::new();
    for name in ["first", "second"] {
        registry
            .register(Arc::new(OverlapCounter {
                name,
                in_flight: Arc::clone(&in_flight),
                max_in_flight: Arc::clone(&max_in_flight),
            }))
            .unwrap();
    }

    let orchestrator = BenchmarkOrchestrator::new(registry, MeasurementRunner::default(), temp.path());
    orchestrator.run_all(workload(), 4).await.unwrap();

    assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_timeout_is_counted_and_run_continues() {
    let temp = TempDir::new().unwrap();
    let mut registry = BackendRegistry::new();
    registry.register(Arc::new(SlowBackend)).unwrap();
    registry.register(Arc::new(WritingBackend { name: "quick" })).unwrap();

    let runner = MeasurementRunner::new(Duration::from_millis(50)).with_memory_probe(Arc::new(ZeroProbe));
    let orchestrator = BenchmarkOrchestrator::new(registry, runner, temp.path());
    let results = orchestrator.run_all(workload(), 2).await.unwrap();

    let slow = results.get("slow").and_then(BackendSummary::empty).unwrap();
    assert_eq!(slow.failures, 2);
    assert_eq!(slow.attempts, 2);

    assert!(results.get("quick").and_then(BackendSummary::stats).is_some());
}

#[tokio::test]
async fn test_attempts_always_match_iterations() {
    let temp = TempDir::new().unwrap();
    let mut registry = BackendRegistry::new();
    registry.register(Arc::new(WritingBackend { name: "ok" })).unwrap();
    registry.register(Arc::new(FailingBackend)).unwrap();

    let orchestrator = BenchmarkOrchestrator::new(registry, deterministic_runner(3), temp.path());

    for iterations in [1, 2, 5] {
        let results = orchestrator.run_all(workload(), iterations).await.unwrap();
        for (name, summary) in &results.backends {
            let attempts = match summary {
                BackendSummary::Stats(stats) => stats.successes + stats.failures,
                BackendSummary::Empty(empty) => empty.attempts,
            };
            assert_eq!(attempts, iterations, "backend {name}");
        }
    }
}

#[tokio::test]
async fn test_zero_iterations_omits_backends() {
    let temp = TempDir::new().unwrap();
    let mut registry = BackendRegistry::new();
    registry.register(Arc::new(WritingBackend { name: "ok" })).unwrap();

    let orchestrator = BenchmarkOrchestrator::new(registry, deterministic_runner(3), temp.path());
    let results = orchestrator.run_all(workload(), 0).await.unwrap();

    assert!(results.backends.is_empty());
    assert_eq!(results.iterations, 0);
}

#[tokio::test]
async fn test_rerun_keeps_existing_artifacts() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("ok");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("previous.pdf"), b"%PDF-old").unwrap();

    let mut registry = BackendRegistry::new();
    registry.register(Arc::new(WritingBackend { name: "ok" })).unwrap();
    let orchestrator = BenchmarkOrchestrator::new(registry, deterministic_runner(3), temp.path());

    orchestrator.run_all(workload(), 1).await.unwrap();
    orchestrator.run_all(workload(), 1).await.unwrap();

    assert_eq!(std::fs::read(dir.join("previous.pdf")).unwrap(), b"%PDF-old");
    assert!(dir.join("render_1.html").exists());
}
