//! render-bench CLI

use clap::{Parser, Subcommand};
use render_bench::config::ConfigOverrides;
use render_bench::output::RESULTS_FILE_NAME;
use render_bench::{
    BenchmarkConfig, BenchmarkOrchestrator, Error, MeasurementRunner, Result, SystemInfo, TrackingAllocator, Workload,
    adapters, render_text, write_json,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: TrackingAllocator = TrackingAllocator;

#[derive(Parser)]
#[command(name = "render-bench")]
#[command(about = "Benchmark harness for document rendering backends", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run benchmarks
    Run {
        /// Configuration file (default: discover render-bench.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of render iterations per backend
        #[arg(short, long)]
        iterations: Option<usize>,

        /// Per-iteration timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Output directory for artifacts and results
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Backends to benchmark (comma-separated)
        #[arg(short = 'B', long, value_delimiter = ',')]
        backends: Vec<String>,

        /// HTML workload file (default: built-in sample document)
        #[arg(short, long)]
        workload: Option<PathBuf>,
    },

    /// List built-in backends in run order
    ListBackends,

    /// Print the effective configuration
    ShowConfig {
        /// Configuration file (default: discover render-bench.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<BenchmarkConfig> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            BenchmarkConfig::from_toml_file(path)
        }
        None => Ok(BenchmarkConfig::discover()?.unwrap_or_default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::ListBackends => {
            let registry = adapters::default_registry()?;
            for (name, backend) in registry.iter() {
                let version = match backend.setup().await {
                    Ok(()) => backend.version(),
                    Err(e) => {
                        tracing::debug!(backend = name, "{}", e);
                        "not available".to_string()
                    }
                };
                println!("{:<20} .{:<4} {}", name, backend.extension(), version);
            }
            Ok(())
        }

        Commands::ShowConfig { config } => {
            let config = load_config(config)?;
            let rendered = toml::to_string_pretty(&config).map_err(|e| Error::Config(e.to_string()))?;
            print!("{}", rendered);
            Ok(())
        }

        Commands::Run {
            config,
            iterations,
            timeout,
            output,
            backends,
            workload,
        } => {
            let mut config = load_config(config)?;
            config.apply_overrides(ConfigOverrides {
                iterations,
                timeout_secs: timeout,
                output_dir: output,
                backends,
                workload,
            });
            config.validate()?;

            let workload = match &config.workload {
                Some(path) => Workload::from_file(path)?,
                None => Workload::sample(),
            };
            tracing::info!(
                workload = workload.name(),
                bytes = workload.size_bytes(),
                iterations = config.iterations,
                "Loaded workload"
            );

            let mut registry = adapters::default_registry()?;
            if let Some(selected) = &config.backends {
                registry.retain_named(selected)?;
            }

            let runner = MeasurementRunner::new(config.timeout());
            let orchestrator = BenchmarkOrchestrator::new(registry, runner, config.output_dir.clone());
            let results = orchestrator.run_all(Arc::new(workload), config.iterations).await?;

            let system = SystemInfo::collect();
            println!("{}", render_text(&results, &system, orchestrator.output_root())?);

            write_json(&results, &system, &config.output_dir.join(RESULTS_FILE_NAME))?;

            Ok(())
        }
    }
}
