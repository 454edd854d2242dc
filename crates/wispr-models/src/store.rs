//! On-disk model store: check, list and delete operations

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ModelError;
use crate::registry::{descriptor, WhisperModel};

/// Download state of a single model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub model: WhisperModel,
    pub downloaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

/// Stateless facade over the model cache directory.
///
/// The layout is the model provider's convention: one flat directory,
/// one file per model named by its remote URL's basename. Nothing else
/// is persisted.
#[derive(Debug, Clone)]
pub struct ModelStore {
    cache_dir: PathBuf,
}

impl ModelStore {
    /// Store at the provider's default location, `~/.cache/whisper`
    pub fn new() -> Result<Self, ModelError> {
        let home = dirs::home_dir().ok_or_else(|| {
            ModelError::CacheDirectory("Could not determine home directory".to_string())
        })?;
        Ok(Self::with_cache_dir(home.join(".cache").join("whisper")))
    }

    /// Store rooted at a custom directory
    pub fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Resolved local path for a model file
    pub fn model_path(&self, model: WhisperModel) -> PathBuf {
        self.cache_dir.join(descriptor(model).filename())
    }

    /// Report whether a model is on disk and how large it is. Never
    /// fails: an unreadable path reads as not downloaded.
    pub async fn status(&self, model: WhisperModel) -> ModelStatus {
        let path = self.model_path(model);
        match tokio::fs::metadata(&path).await {
            Ok(meta) => ModelStatus {
                model,
                downloaded: true,
                path: Some(path),
                size_bytes: Some(meta.len()),
            },
            Err(_) => ModelStatus {
                model,
                downloaded: false,
                path: None,
                size_bytes: None,
            },
        }
    }

    /// Status for every catalog model, in catalog order
    pub async fn list(&self) -> Vec<ModelStatus> {
        let mut statuses = Vec::with_capacity(WhisperModel::ALL.len());
        for model in WhisperModel::ALL {
            statuses.push(self.status(model).await);
        }
        statuses
    }

    /// Delete a downloaded model file, returning the freed byte count
    pub async fn delete(&self, model: WhisperModel) -> Result<u64, ModelError> {
        let path = self.model_path(model);
        match tokio::fs::metadata(&path).await {
            Ok(meta) => {
                let freed = meta.len();
                tokio::fs::remove_file(&path).await?;
                info!("Deleted model {} ({} bytes freed)", model, freed);
                Ok(freed)
            }
            Err(_) => Err(ModelError::NotFound(model.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ModelStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::with_cache_dir(dir.path().to_path_buf());
        (dir, store)
    }

    #[test]
    fn model_path_uses_url_basename() {
        let store = ModelStore::with_cache_dir(PathBuf::from("/tmp/whisper"));
        assert_eq!(
            store.model_path(WhisperModel::Tiny),
            PathBuf::from("/tmp/whisper/ggml-tiny.bin")
        );
    }

    #[tokio::test]
    async fn status_tracks_download_and_delete() {
        let (_dir, store) = store();

        let before = store.status(WhisperModel::Tiny).await;
        assert!(!before.downloaded);
        assert!(before.size_bytes.is_none());

        tokio::fs::write(store.model_path(WhisperModel::Tiny), b"model bytes")
            .await
            .unwrap();

        let after = store.status(WhisperModel::Tiny).await;
        assert!(after.downloaded);
        assert!(after.size_bytes.unwrap() > 0);

        let freed = store.delete(WhisperModel::Tiny).await.unwrap();
        assert_eq!(freed, 11);
        assert!(!store.status(WhisperModel::Tiny).await.downloaded);
    }

    #[tokio::test]
    async fn delete_missing_model_is_typed_not_found() {
        let (_dir, store) = store();
        let err = store.delete(WhisperModel::Base).await.unwrap_err();
        assert!(matches!(err, ModelError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_covers_catalog_in_stable_order() {
        let (_dir, store) = store();
        tokio::fs::write(store.model_path(WhisperModel::Small), b"x")
            .await
            .unwrap();

        let statuses = store.list().await;
        assert_eq!(statuses.len(), WhisperModel::ALL.len());
        let order: Vec<WhisperModel> = statuses.iter().map(|s| s.model).collect();
        assert_eq!(order, WhisperModel::ALL);
        assert!(statuses[2].downloaded);
        assert!(!statuses[0].downloaded);
    }
}
