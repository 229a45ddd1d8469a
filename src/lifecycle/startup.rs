//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the run context once from the loaded configuration
//! - Select the execution mode and wire its collaborators
//! - Connect OS signals to the shutdown coordinator
//!
//! # Design Decisions
//! - Fail fast: configuration, schema and bind errors are fatal
//! - The listener is bound before the server reports itself as listening

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::batch::BatchRunner;
use crate::config::{ConfigError, RunContext, RunnerConfig};
use crate::http::{ServerError, StandbyServer};
use crate::lifecycle::mode::{select_mode, Mode};
use crate::lifecycle::outcome::RunOutcome;
use crate::lifecycle::shutdown::{DrainOutcome, Shutdown};
use crate::lifecycle::signals::spawn_signal_listener;
use crate::net::{self, ListenerError};
use crate::storage::{self, LocalStorage};
use crate::task::schema::{InputSchema, InputValidator, SchemaLoadError};
use crate::task::SharedProcessor;

/// Fatal errors before or while starting a run.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("input schema error: {0}")]
    Schema(#[from] SchemaLoadError),
    #[error("listener error: {0}")]
    Listener(#[from] ListenerError),
    #[error("standby server error: {0}")]
    Server(#[from] ServerError),
}

/// Run the controller until its mode finishes, with OS signals wired to shutdown.
pub async fn run(config: RunnerConfig, processor: SharedProcessor) -> Result<RunOutcome, StartupError> {
    let shutdown = Shutdown::new();
    let signals = spawn_signal_listener(shutdown.clone());
    let result = run_with_shutdown(&config, processor, shutdown).await;
    signals.abort();
    result
}

/// Run the controller against an externally owned shutdown coordinator.
pub async fn run_with_shutdown(
    config: &RunnerConfig,
    processor: SharedProcessor,
    shutdown: Shutdown,
) -> Result<RunOutcome, StartupError> {
    let context = RunContext::from_config(config)?;
    let mode = select_mode(&context);
    tracing::info!(mode = %mode, origin = %context.origin, "Starting controller");

    let validator = load_validator(config)?;

    match mode {
        Mode::Batch => Ok(run_batch(config, processor, validator, shutdown).await),
        Mode::Standby => {
            let listener = net::bind(net::standby_address(context.port)).await?;
            serve_standby(config, &context, processor, validator, shutdown, listener).await
        }
    }
}

fn load_validator(config: &RunnerConfig) -> Result<Option<Arc<dyn InputValidator>>, StartupError> {
    let Some(path) = &config.run.input_schema_path else {
        return Ok(None);
    };
    let schema = InputSchema::from_file(path)?;
    tracing::info!(
        path = %path.display(),
        properties = schema.properties.len(),
        required = schema.required.len(),
        "Input schema loaded"
    );
    Ok(Some(Arc::new(schema)))
}

/// Load the batch input, run the task once and store its result.
pub async fn run_batch(
    config: &RunnerConfig,
    processor: SharedProcessor,
    validator: Option<Arc<dyn InputValidator>>,
    shutdown: Shutdown,
) -> RunOutcome {
    let storage = Arc::new(LocalStorage::open(&config.run.storage_dir));
    let loaded = match &config.run.input_path {
        Some(path) => storage::load_input(path).await,
        None => storage::load_stored_input(storage.key_value_store()).await,
    };

    let input = match loaded {
        Ok(input) => input,
        Err(e) => {
            tracing::error!(
                kind = %e.kind,
                error = %e.message,
                "Failed to load input"
            );
            return RunOutcome::Failed(e.kind);
        }
    };

    let mut runner = BatchRunner::new(processor, storage, shutdown.clone())
        .with_grace(Duration::from_secs(config.shutdown.grace_secs));
    if let Some(validator) = validator {
        runner = runner.with_validator(validator);
    }
    if let Some(secs) = config.timeouts.batch_secs {
        runner = runner.with_time_limit(Duration::from_secs(secs));
    }

    let outcome = runner.run(input).await;
    shutdown.mark_stopped();
    outcome
}

/// Serve standby requests on `listener` until shutdown completes.
pub async fn serve_standby(
    config: &RunnerConfig,
    context: &RunContext,
    processor: SharedProcessor,
    validator: Option<Arc<dyn InputValidator>>,
    shutdown: Shutdown,
    listener: TcpListener,
) -> Result<RunOutcome, StartupError> {
    let mut server = StandbyServer::new(config, context, processor, shutdown)?;
    if let Some(validator) = validator {
        server = server.with_validator(validator);
    }
    if let Some(url) = &context.public_url {
        tracing::info!(public_url = %url, "Standby server reachable");
    }

    match server.run(listener).await? {
        DrainOutcome::Graceful => Ok(RunOutcome::Succeeded),
        DrainOutcome::Forced => Ok(RunOutcome::ForcedStop),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::SampleProcessor;

    #[tokio::test]
    async fn missing_schema_file_is_fatal() {
        let mut config = RunnerConfig::default();
        config.run.input_schema_path = Some("/definitely/not/here.json".into());
        let err = run_with_shutdown(&config, Arc::new(SampleProcessor), Shutdown::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StartupError::Schema(_)));
    }

    #[tokio::test]
    async fn batch_run_with_sample_processor() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RunnerConfig::default();
        config.run.storage_dir = dir.path().to_path_buf();

        let outcome = run_with_shutdown(&config, Arc::new(SampleProcessor), Shutdown::new())
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Succeeded);
        assert!(dir.path().join("datasets/default/000000010.json").exists());
    }
}
