//! Batch input loading.

use std::path::Path;

use serde_json::Value;

use crate::storage::key_value::LocalKeyValueStore;
use crate::storage::INPUT_KEY;
use crate::task::types::{TaskError, TaskInput};

/// Load the batch input from an explicit document.
///
/// A missing file is an empty input. Anything other than a JSON object is
/// a Validation error.
pub async fn load_input(path: &Path) -> Result<TaskInput, TaskError> {
    match tokio::fs::read(path).await {
        Ok(content) => parse_input(Some(&content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => parse_input(None),
        Err(e) => Err(TaskError::internal(format!(
            "Failed to read input from {}: {}",
            path.display(),
            e
        ))
        .with_code("INPUT_UNREADABLE")),
    }
}

/// Load the batch input from the `INPUT.json` record of `store`.
pub async fn load_stored_input(store: &LocalKeyValueStore) -> Result<TaskInput, TaskError> {
    let record = store.get_record(INPUT_KEY).await.map_err(|e| {
        TaskError::internal(format!("Failed to read input record: {}", e)).with_code("INPUT_UNREADABLE")
    })?;
    parse_input(record.as_deref())
}

fn parse_input(content: Option<&[u8]>) -> Result<TaskInput, TaskError> {
    let Some(content) = content else {
        tracing::info!("No input record, using empty input");
        return Ok(TaskInput::new());
    };

    match serde_json::from_slice::<Value>(content) {
        Ok(Value::Object(input)) => Ok(input),
        Ok(Value::Null) => Ok(TaskInput::new()),
        Ok(_) => Err(TaskError::validation("Input must be a JSON object.").with_code("INVALID_INPUT")),
        Err(e) => Err(
            TaskError::validation(format!("Input is not valid JSON: {}", e)).with_code("INVALID_JSON"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::types::TaskErrorKind;
    use serde_json::json;

    #[tokio::test]
    async fn missing_file_is_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = load_input(&dir.path().join("INPUT.json")).await.unwrap();
        assert!(input.is_empty());
    }

    #[tokio::test]
    async fn reads_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("INPUT.json");
        std::fs::write(&path, r#"{"url": "https://example.com", "maxItems": 2}"#).unwrap();
        let input = load_input(&path).await.unwrap();
        assert_eq!(input.get("maxItems"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn non_object_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("INPUT.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert_eq!(load_input(&path).await.unwrap_err().kind, TaskErrorKind::Validation);

        std::fs::write(&path, "{broken").unwrap();
        assert_eq!(
            load_input(&path).await.unwrap_err().code.as_deref(),
            Some("INVALID_JSON")
        );
    }

    #[tokio::test]
    async fn stored_input_comes_from_the_input_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalKeyValueStore::open(dir.path());
        assert!(load_stored_input(&store).await.unwrap().is_empty());

        store
            .set_record(INPUT_KEY, "application/json", br#"{"startUrl": "https://apify.com"}"#)
            .await
            .unwrap();
        let input = load_stored_input(&store).await.unwrap();
        assert_eq!(input.get("startUrl"), Some(&json!("https://apify.com")));
    }
}
