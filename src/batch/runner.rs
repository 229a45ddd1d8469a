//! Batch runner.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::lifecycle::outcome::RunOutcome;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;
use crate::storage::ResultSink;
use crate::task::schema::{self, InputValidator};
use crate::task::types::{TaskError, TaskInput, TaskResult};
use crate::task::{processor, SharedProcessor};

const DEFAULT_GRACE: Duration = Duration::from_secs(10);

pub struct BatchRunner {
    processor: SharedProcessor,
    sink: Arc<dyn ResultSink>,
    shutdown: Shutdown,
    validator: Option<Arc<dyn InputValidator>>,
    time_limit: Option<Duration>,
    grace: Duration,
}

impl BatchRunner {
    pub fn new(processor: SharedProcessor, sink: Arc<dyn ResultSink>, shutdown: Shutdown) -> Self {
        Self {
            processor,
            sink,
            shutdown,
            validator: None,
            time_limit: None,
            grace: DEFAULT_GRACE,
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn InputValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// How long a cancelled processor may take to return after an abort.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Run the task once and store its result.
    ///
    /// No retries. An abort cancels the processor token; whatever the
    /// processor returns within the grace period is the run's result.
    /// Past the grace period the run ends as [`RunOutcome::Aborted`].
    pub async fn run(&self, input: TaskInput) -> RunOutcome {
        let start = Instant::now();
        let outcome = self.execute(input).await;
        metrics::record_batch_run(outcome.exit_code());
        tracing::info!(
            outcome = ?outcome,
            exit_code = outcome.exit_code(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Batch run finished"
        );
        outcome
    }

    async fn execute(&self, input: TaskInput) -> RunOutcome {
        if self.shutdown.is_requested() {
            tracing::warn!("Abort received before the task started");
            return RunOutcome::Aborted;
        }

        let input = match &self.validator {
            Some(validator) => match schema::check_input(validator.as_ref(), input) {
                Ok(input) => input,
                Err(e) => return failed(e),
            },
            None => input,
        };

        let cancel = self.shutdown.child_token();
        let task = processor::run_to_completion(
            Arc::clone(&self.processor),
            input,
            cancel.clone(),
            self.time_limit,
        );
        tokio::pin!(task);

        let result: Result<TaskResult, TaskError> = tokio::select! {
            result = &mut task => result,
            _ = self.shutdown.requested() => {
                tracing::warn!(grace_ms = self.grace.as_millis() as u64, "Abort received, cancelling task");
                cancel.cancel();
                match tokio::time::timeout(self.grace, &mut task).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!("Task did not return within the grace period");
                        return RunOutcome::Aborted;
                    }
                }
            }
        };

        let result = match result {
            Ok(result) => result,
            Err(e) => return failed(e),
        };

        match self.sink.push(result).await {
            Ok(receipt) => {
                tracing::info!(
                    items = receipt.items,
                    artifacts = receipt.artifacts,
                    "Task succeeded"
                );
                RunOutcome::Succeeded
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to store task result");
                RunOutcome::SinkFailed
            }
        }
    }
}

fn failed(err: TaskError) -> RunOutcome {
    tracing::error!(
        kind = %err.kind,
        code = err.code.as_deref().unwrap_or(""),
        error = %err.message,
        "Task failed"
    );
    RunOutcome::Failed(err.kind)
}
