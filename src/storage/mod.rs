//! Result storage for batch runs.
//!
//! # Data Flow
//! ```text
//! INPUT.json (key_value_stores/default) ──input.rs──▶ TaskInput
//!
//! TaskResult
//!     → LocalStorage (ResultSink)
//!         → dataset.rs (payload items → datasets/default/000000001.json, ...)
//!         → key_value.rs (artifacts → key_value_stores/default/<name>)
//! ```
//!
//! # Design Decisions
//! - On-disk layout matches the platform's local storage emulation
//! - A result is checked in full before the first file is written
//! - Directories are created lazily on first write

pub mod dataset;
pub mod input;
pub mod key_value;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::task::types::TaskResult;

pub use dataset::LocalDataset;
pub use input::{load_input, load_stored_input};
pub use key_value::LocalKeyValueStore;

/// Name of the default dataset and key-value store.
pub const DEFAULT_STORE: &str = "default";

/// Key of the input record in the default key-value store.
pub const INPUT_KEY: &str = "INPUT.json";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("dataset item {index} rejected: {reason}")]
    InvalidItem { index: usize, reason: String },
    #[error("invalid record key {0:?}")]
    InvalidKey(String),
}

impl StorageError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What a push stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushReceipt {
    pub items: usize,
    pub artifacts: usize,
}

/// Destination for the result of a successful batch run.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn push(&self, result: TaskResult) -> Result<PushReceipt, StorageError>;
}

/// Local storage root with the default dataset and key-value store.
#[derive(Debug)]
pub struct LocalStorage {
    root: PathBuf,
    dataset: LocalDataset,
    key_value: LocalKeyValueStore,
}

impl LocalStorage {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            dataset: LocalDataset::open(root.join("datasets").join(DEFAULT_STORE)),
            key_value: LocalKeyValueStore::open(root.join("key_value_stores").join(DEFAULT_STORE)),
            root,
        }
    }

    /// The default key-value store, which also holds the input record.
    pub fn key_value_store(&self) -> &LocalKeyValueStore {
        &self.key_value
    }
}

#[async_trait]
impl ResultSink for LocalStorage {
    async fn push(&self, result: TaskResult) -> Result<PushReceipt, StorageError> {
        let items = dataset::split_items(result.payload)?;
        for artifact in &result.artifacts {
            key_value::check_key(&artifact.name)?;
        }

        let items = self.dataset.push_items(items).await?;
        for artifact in &result.artifacts {
            self.key_value
                .set_record(&artifact.name, &artifact.content_type, &artifact.data)
                .await?;
        }

        tracing::info!(
            items,
            artifacts = result.artifacts.len(),
            root = %self.root.display(),
            "Result stored"
        );
        Ok(PushReceipt {
            items,
            artifacts: result.artifacts.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::types::Artifact;
    use serde_json::json;

    #[tokio::test]
    async fn push_writes_items_and_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path());

        let result = TaskResult::new(json!([{"index": 0}, {"index": 1}]))
            .with_artifact(Artifact::new("OUTPUT.txt", "text/plain", b"done".to_vec()));
        let receipt = storage.push(result).await.unwrap();
        assert_eq!(receipt, PushReceipt { items: 2, artifacts: 1 });

        let datasets = dir.path().join("datasets/default");
        assert!(datasets.join("000000001.json").exists());
        assert!(datasets.join("000000002.json").exists());

        let kv = dir.path().join("key_value_stores/default");
        assert_eq!(std::fs::read(kv.join("OUTPUT.txt")).unwrap(), b"done");
    }

    #[tokio::test]
    async fn rejected_result_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path());

        let result = TaskResult::new(json!([{"ok": true}]))
            .with_artifact(Artifact::new("../escape", "text/plain", Vec::new()));
        assert!(matches!(
            storage.push(result).await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(!dir.path().join("datasets").exists());
    }

    #[test]
    fn input_record_is_in_default_store() {
        let storage = LocalStorage::open("/tmp/storage");
        assert_eq!(
            storage.key_value_store().record_path(INPUT_KEY),
            PathBuf::from("/tmp/storage/key_value_stores/default/INPUT.json")
        );
    }
}
