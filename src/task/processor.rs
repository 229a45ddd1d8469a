//! The pluggable business-logic capability and the controller's way of invoking it.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::task::types::{TaskError, TaskInput, TaskResult};

/// Business logic run once per task.
///
/// Implementations own their concurrency safety: the controller may call
/// `process` from many requests at once and treats every call as independent.
/// `cancel` fires on timeout or shutdown; implementations should check it
/// between units of work and return promptly.
#[async_trait]
pub trait TaskProcessor: Send + Sync + 'static {
    async fn process(
        &self,
        input: TaskInput,
        cancel: CancellationToken,
    ) -> Result<TaskResult, TaskError>;
}

pub type SharedProcessor = Arc<dyn TaskProcessor>;

/// Run `processor` on `input`, bounded by `time_limit` and `cancel`.
///
/// The processor runs in its own task, so a panic surfaces as an Internal
/// error instead of unwinding into the caller. On timeout the token is
/// cancelled and the processor is left to wind down on its own.
pub async fn invoke(
    processor: SharedProcessor,
    input: TaskInput,
    cancel: CancellationToken,
    time_limit: Option<Duration>,
) -> Result<TaskResult, TaskError> {
    let stop = cancel.clone();
    tokio::select! {
        biased;
        result = run_to_completion(processor, input, cancel, time_limit) => result,
        _ = stop.cancelled() => {
            Err(TaskError::internal("task was cancelled before it finished").with_code("CANCELLED"))
        }
    }
}

/// Like [`invoke`], but keeps waiting after `cancel` fires so the processor
/// can return its own result. Only the time limit stops the wait.
pub async fn run_to_completion(
    processor: SharedProcessor,
    input: TaskInput,
    cancel: CancellationToken,
    time_limit: Option<Duration>,
) -> Result<TaskResult, TaskError> {
    let token = cancel.clone();
    let mut handle = tokio::spawn(async move { processor.process(input, token).await });

    let deadline = async move {
        match time_limit {
            Some(limit) => {
                tokio::time::sleep(limit).await;
                limit
            }
            None => std::future::pending::<Duration>().await,
        }
    };

    tokio::select! {
        joined = &mut handle => match joined {
            Ok(result) => result,
            Err(err) => Err(join_failure(err)),
        },
        limit = deadline => {
            cancel.cancel();
            Err(TaskError::timeout(format!("task did not finish within {:?}", limit))
                .with_code("TIMED_OUT"))
        }
    }
}

fn join_failure(err: JoinError) -> TaskError {
    if err.is_panic() {
        let payload = err.into_panic();
        TaskError::internal(format!(
            "task processor panicked: {}",
            panic_message(payload.as_ref())
        ))
        .with_code("PROCESSOR_PANIC")
    } else {
        TaskError::internal("task processor was aborted").with_code("PROCESSOR_ABORTED")
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::types::TaskErrorKind;
    use serde_json::{json, Map};

    struct Echo;

    #[async_trait]
    impl TaskProcessor for Echo {
        async fn process(&self, input: TaskInput, _: CancellationToken) -> Result<TaskResult, TaskError> {
            Ok(TaskResult::new(serde_json::Value::Object(input)))
        }
    }

    struct Stubborn;

    #[async_trait]
    impl TaskProcessor for Stubborn {
        async fn process(&self, _: TaskInput, _: CancellationToken) -> Result<TaskResult, TaskError> {
            std::future::pending().await
        }
    }

    struct Panicky;

    #[async_trait]
    impl TaskProcessor for Panicky {
        async fn process(&self, _: TaskInput, _: CancellationToken) -> Result<TaskResult, TaskError> {
            panic!("selector not found");
        }
    }

    fn input() -> TaskInput {
        let mut map = Map::new();
        map.insert("url".into(), json!("https://example.com"));
        map
    }

    #[tokio::test]
    async fn returns_processor_result() {
        let result = invoke(Arc::new(Echo), input(), CancellationToken::new(), None)
            .await
            .unwrap();
        assert_eq!(result.payload, json!({"url": "https://example.com"}));
    }

    #[tokio::test]
    async fn times_out_and_cancels_token() {
        let token = CancellationToken::new();
        let err = invoke(
            Arc::new(Stubborn),
            input(),
            token.clone(),
            Some(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, TaskErrorKind::Timeout);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn panic_becomes_internal_error() {
        let err = invoke(Arc::new(Panicky), input(), CancellationToken::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, TaskErrorKind::Internal);
        assert!(err.message.contains("selector not found"));
    }

    #[tokio::test]
    async fn external_cancellation_stops_waiting() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });
        let err = invoke(Arc::new(Stubborn), input(), token, None).await.unwrap_err();
        assert_eq!(err.code.as_deref(), Some("CANCELLED"));
    }

    struct FinishesAfterCancel;

    #[async_trait]
    impl TaskProcessor for FinishesAfterCancel {
        async fn process(&self, _: TaskInput, cancel: CancellationToken) -> Result<TaskResult, TaskError> {
            cancel.cancelled().await;
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(TaskResult::new(json!({"partial": true})))
        }
    }

    #[tokio::test]
    async fn run_to_completion_waits_past_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let result = run_to_completion(Arc::new(FinishesAfterCancel), input(), token, None)
            .await
            .unwrap();
        assert_eq!(result.payload, json!({"partial": true}));
    }
}
