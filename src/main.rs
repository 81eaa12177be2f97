//! Service Lifecycle Controller
//!
//! Aggregates the health of a process's dependencies and shuts them down
//! within a single deadline when the process is asked to stop.
//!
//! # Architecture Overview
//!
//! ```text
//!     GET /health ──────────▶ HealthAggregator ──probe()──┐
//!                                                          ▼
//!                                             ┌────────────────────────┐
//!                                             │    ResourceRegistry     │
//!                                             │ listener memory disk    │
//!                                             │ db cache (dependencies) │
//!                                             └────────────────────────┘
//!                                                          ▲
//!     SIGTERM/SIGINT/SIGHUP ─┐                             │
//!     POST /admin/shutdown ──┼─▶ ShutdownOrchestrator ──release()──┘
//!     server fault ──────────┘        │
//!                                     ▼
//!                              ShutdownReport ──▶ exit code
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use service_lifecycle::config::{self, validation::validate_config, ConfigError, ServiceConfig};
use service_lifecycle::lifecycle::signals::spawn_signal_listener;
use service_lifecycle::lifecycle::startup::launch;
use service_lifecycle::observability::{logging::init_logging, metrics::init_metrics};

#[derive(Parser)]
#[command(name = "service-lifecycle")]
#[command(about = "Health aggregation and deadline-bounded graceful shutdown", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "LIFECYCLE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(long)]
    bind: Option<String>,

    /// Override the memory ceiling in megabytes.
    #[arg(long, env = "MAX_MEMORY_USAGE_MB")]
    max_memory_mb: Option<u64>,

    /// Override the shutdown deadline in milliseconds.
    #[arg(long)]
    shutdown_deadline_ms: Option<u64>,
}

impl Cli {
    fn load_config(&self) -> Result<ServiceConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::load_config(path)?,
            None => ServiceConfig::default(),
        };

        if let Some(bind) = &self.bind {
            config.server.bind_address = bind.clone();
        }
        if let Some(mb) = self.max_memory_mb {
            config.health.memory_ceiling_mb = mb;
        }
        if let Some(ms) = self.shutdown_deadline_ms {
            config.shutdown.deadline_ms = ms;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("service-lifecycle: {e}");
            return ExitCode::from(1);
        }
    };

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "service-lifecycle starting");
    tracing::info!(
        bind_address = %config.server.bind_address,
        dependencies = config.dependencies.len(),
        shutdown_deadline_ms = config.shutdown.deadline_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            init_metrics(addr);
        }
    }

    let service = match launch(&config).await {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = spawn_signal_listener(service.orchestrator.clone(), service.shutdown_deadline) {
        tracing::error!(error = %e, "Failed to install signal handlers");
    }

    let report = service.orchestrator.completed().await;
    for (name, outcome) in &report.outcomes {
        tracing::info!(resource = %name, outcome = ?outcome, "Release outcome");
    }
    let code = report.exit_code();
    tracing::info!(
        result = report.result.as_str(),
        cause = %report.cause,
        exit_code = code,
        "Shutdown complete"
    );

    // Releases abandoned at the deadline may still be running; exiting ends them.
    std::process::exit(code);
}
