//! Append-only local dataset.

use std::path::PathBuf;

use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::storage::StorageError;

/// Dataset stored as one pretty-printed JSON file per item.
#[derive(Debug)]
pub struct LocalDataset {
    dir: PathBuf,
    // Last written index; `None` until the directory has been scanned.
    last_index: Mutex<Option<u64>>,
}

/// Turn a result payload into dataset items.
///
/// An array becomes one item per element, an object a single item and
/// `null` no items at all. Every item must be a JSON object.
pub fn split_items(payload: Value) -> Result<Vec<Map<String, Value>>, StorageError> {
    let values = match payload {
        Value::Null => Vec::new(),
        Value::Array(values) => values,
        other => vec![other],
    };

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(item) => Ok(item),
            other => Err(StorageError::InvalidItem {
                index,
                reason: format!("expected a JSON object, got {}", kind_of(&other)),
            }),
        })
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn item_file_name(index: u64) -> String {
    format!("{:09}.json", index)
}

impl LocalDataset {
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_index: Mutex::new(None),
        }
    }

    /// Append items, returning how many were written.
    pub async fn push_items(&self, items: Vec<Map<String, Value>>) -> Result<usize, StorageError> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut last_index = self.last_index.lock().await;
        let mut index = match *last_index {
            Some(index) => index,
            None => self.scan_last_index().await?,
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::io(&self.dir, e))?;

        let count = items.len();
        for item in items {
            index += 1;
            let path = self.dir.join(item_file_name(index));
            let content = serde_json::to_string_pretty(&item)?;
            tokio::fs::write(&path, content)
                .await
                .map_err(|e| StorageError::io(&path, e))?;
            *last_index = Some(index);
        }

        tracing::debug!(dataset = %self.dir.display(), count, last_index = index, "Items pushed");
        Ok(count)
    }

    /// Highest item index already on disk, so reruns append instead of overwrite.
    async fn scan_last_index(&self) -> Result<u64, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(StorageError::io(&self.dir, e)),
        };

        let mut last = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&self.dir, e))?
        {
            let name = entry.file_name();
            let index = name
                .to_str()
                .and_then(|n| n.strip_suffix(".json"))
                .and_then(|n| n.parse::<u64>().ok());
            if let Some(index) = index {
                last = last.max(index);
            }
        }
        Ok(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn splits_arrays_and_wraps_objects() {
        assert_eq!(split_items(json!([{"a": 1}, {"b": 2}])).unwrap().len(), 2);
        assert_eq!(split_items(json!({"a": 1})).unwrap().len(), 1);
        assert!(split_items(json!(null)).unwrap().is_empty());
    }

    #[test]
    fn rejects_non_object_items() {
        match split_items(json!([{"a": 1}, "nope"])) {
            Err(StorageError::InvalidItem { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidItem, got {other:?}"),
        }
        assert!(split_items(json!(42)).is_err());
    }

    #[tokio::test]
    async fn numbering_continues_across_pushes_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = LocalDataset::open(dir.path().join("ds"));

        let first = split_items(json!([{"n": 1}, {"n": 2}])).unwrap();
        assert_eq!(dataset.push_items(first).await.unwrap(), 2);

        let reopened = LocalDataset::open(dir.path().join("ds"));
        let second = split_items(json!({"n": 3})).unwrap();
        reopened.push_items(second).await.unwrap();

        let third: Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("ds/000000003.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(third, json!({"n": 3}));
    }

    #[tokio::test]
    async fn empty_push_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = LocalDataset::open(dir.path().join("ds"));
        assert_eq!(dataset.push_items(Vec::new()).await.unwrap(), 0);
        assert!(!dataset.dir.exists());
    }
}
