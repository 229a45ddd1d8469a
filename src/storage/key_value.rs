//! Local key-value store for artifacts and the input record.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::storage::StorageError;

const MAX_KEY_LEN: usize = 256;
const METADATA_SUFFIX: &str = ".__metadata__.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    pub key: String,
    pub content_type: String,
}

/// Record keys: 1 to 256 characters from `[a-zA-Z0-9!-_.'()]`.
pub fn check_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key != "."
        && key != ".."
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "!-_.'()".contains(c));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

#[derive(Debug)]
pub struct LocalKeyValueStore {
    dir: PathBuf,
}

impl LocalKeyValueStore {
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn metadata_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}{METADATA_SUFFIX}"))
    }

    /// Store `data` under `key`, recording its content type alongside.
    pub async fn set_record(
        &self,
        key: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<(), StorageError> {
        check_key(key)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::io(&self.dir, e))?;

        let path = self.record_path(key);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| StorageError::io(&path, e))?;

        let metadata = RecordMetadata {
            key: key.to_string(),
            content_type: content_type.to_string(),
        };
        let metadata_path = self.metadata_path(key);
        tokio::fs::write(&metadata_path, serde_json::to_string_pretty(&metadata)?)
            .await
            .map_err(|e| StorageError::io(&metadata_path, e))?;

        tracing::debug!(key, content_type, size = data.len(), "Record stored");
        Ok(())
    }

    /// Read a record, or `None` when it does not exist.
    pub async fn get_record(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        check_key(key)?;
        let path = self.record_path(key);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }
}
