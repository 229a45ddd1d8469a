use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use actor_controller::config::{load_config, ConfigOverrides, ProcessEnv};
use actor_controller::lifecycle::startup;
use actor_controller::observability::{init_logging, metrics};
use actor_controller::task::SampleProcessor;

#[derive(Parser)]
#[command(name = "actor-controller")]
#[command(about = "Run an actor task as a batch job or a standby HTTP server", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run origin; STANDBY starts the HTTP server
    #[arg(long)]
    origin: Option<String>,

    /// Standby server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Batch input document
    #[arg(short, long)]
    input: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let overrides = ConfigOverrides {
        origin: cli.origin,
        port: cli.port,
        input_path: cli.input,
    };

    let config = match load_config(cli.config.as_deref(), &ProcessEnv, &overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("actor-controller: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("actor-controller: failed to initialise logging: {e}");
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "actor-controller starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    match startup::run(config, Arc::new(SampleProcessor)).await {
        Ok(outcome) => {
            tracing::info!(outcome = ?outcome, exit_code = outcome.exit_code(), "Shutdown complete");
            outcome.into()
        }
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            ExitCode::FAILURE
        }
    }
}
