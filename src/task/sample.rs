//! Built-in processor used by the `actor-controller` binary.
//!
//! Emits `maxItems` records describing the start URL, each stamped with the
//! time it was produced. Real deployments plug in their own [`TaskProcessor`].

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::task::processor::TaskProcessor;
use crate::task::types::{TaskError, TaskInput, TaskResult};

const DEFAULT_START_URL: &str = "https://example.com";
const DEFAULT_MAX_ITEMS: u64 = 10;
const MAX_ITEMS_LIMIT: u64 = 1000;

#[derive(Debug, Clone, Copy, Default)]
pub struct SampleProcessor;

#[async_trait]
impl TaskProcessor for SampleProcessor {
    async fn process(
        &self,
        input: TaskInput,
        cancel: CancellationToken,
    ) -> Result<TaskResult, TaskError> {
        let url = start_url(&input);
        let max_items = max_items(&input)?;

        tracing::info!(url = %url, max_items, "Processing URL");

        let mut items = Vec::with_capacity(max_items as usize);
        for index in 0..max_items {
            if cancel.is_cancelled() {
                return Err(TaskError::internal("run was cancelled").with_code("CANCELLED"));
            }
            items.push(json!({
                "index": index,
                "url": url,
                "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            }));
            tokio::task::yield_now().await;
        }

        tracing::info!(items = items.len(), "Successfully processed items");
        Ok(TaskResult::new(Value::Array(items)))
    }
}

fn start_url(input: &TaskInput) -> String {
    ["url", "startUrl"]
        .iter()
        .filter_map(|key| input.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_START_URL)
        .to_string()
}

fn max_items(input: &TaskInput) -> Result<u64, TaskError> {
    let parsed = match input.get("maxItems") {
        None | Some(Value::Null) => return Ok(DEFAULT_MAX_ITEMS),
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };

    match parsed {
        Some(n) if n <= MAX_ITEMS_LIMIT => Ok(n),
        _ => Err(TaskError::validation(format!(
            "`maxItems` must be a whole number between 0 and {}",
            MAX_ITEMS_LIMIT
        ))
        .with_code("INVALID_MAX_ITEMS")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::types::TaskErrorKind;

    fn input(value: Value) -> TaskInput {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn uses_defaults_for_empty_input() {
        let result = SampleProcessor
            .process(TaskInput::new(), CancellationToken::new())
            .await
            .unwrap();
        let items = result.payload.as_array().unwrap();
        assert_eq!(items.len(), 10);
        assert_eq!(items[0]["url"], "https://example.com");
        assert_eq!(items[9]["index"], 9);
    }

    #[tokio::test]
    async fn coerces_query_string_max_items() {
        let result = SampleProcessor
            .process(
                input(json!({"url": "https://apify.com", "maxItems": "2"})),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        let items = result.payload.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["url"], "https://apify.com");
    }

    #[tokio::test]
    async fn accepts_start_url_alias() {
        let result = SampleProcessor
            .process(
                input(json!({"startUrl": "https://crawlee.dev", "maxItems": 1})),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(result.payload[0]["url"], "https://crawlee.dev");
    }

    #[tokio::test]
    async fn rejects_bad_max_items() {
        let err = SampleProcessor
            .process(input(json!({"maxItems": "lots"})), CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, TaskErrorKind::Validation);
    }

    #[tokio::test]
    async fn stops_when_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let err = SampleProcessor
            .process(input(json!({"maxItems": 5})), token)
            .await
            .unwrap_err();
        assert_eq!(err.code.as_deref(), Some("CANCELLED"));
    }
}
