//! Mode handlers: one per operation, each producing the JSON payload
//! for stdout

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use wispr_asr::{check_ffmpeg, Transcript, WhisperLoader};
use wispr_models::{
    Downloader, HttpFetcher, ModelCache, ModelStore, ProgressEvent, WhisperModel,
};

use crate::result::{
    mb, CheckReport, DeleteReport, DownloadReport, ErrorKind, FailureReport, FfmpegReport,
    ListEntry, ListReport,
};

/// Serialize a report. These payloads are plain data and cannot fail to
/// serialize in practice; if one somehow does, the caller still gets a
/// well-formed failure object.
pub fn to_json<T: Serialize>(report: &T) -> Value {
    serde_json::to_value(report).unwrap_or_else(|e| {
        serde_json::json!({ "error": e.to_string(), "error_kind": "io", "success": false })
    })
}

/// Stream one progress event as a `PROGRESS:` line on stderr, keeping
/// stdout clean for the final result
fn emit_progress(event: &ProgressEvent) {
    if let Ok(json) = serde_json::to_string(event) {
        eprintln!("PROGRESS:{json}");
    }
}

pub async fn download(store: ModelStore, model: WhisperModel) -> Value {
    let downloader = match Downloader::new(store) {
        Ok(downloader) => downloader,
        Err(e) => {
            return to_json(
                &FailureReport::new(e.to_string(), ErrorKind::from(&e))
                    .with_model(model)
                    .not_downloaded(),
            )
        }
    };

    match downloader.download(model, emit_progress).await {
        Ok(outcome) => to_json(&DownloadReport {
            model,
            downloaded: true,
            path: outcome.path,
            size_bytes: outcome.size_bytes,
            size_mb: mb(outcome.size_bytes),
            success: true,
        }),
        Err(e) => to_json(
            &FailureReport::new(e.to_string(), ErrorKind::from(&e))
                .with_model(model)
                .not_downloaded(),
        ),
    }
}

pub async fn check(store: ModelStore, model: WhisperModel) -> Value {
    to_json(&CheckReport::from(store.status(model).await))
}

pub async fn list(store: ModelStore) -> Value {
    let models = store
        .list()
        .await
        .into_iter()
        .map(ListEntry::from)
        .collect();
    to_json(&ListReport {
        models,
        cache_dir: store.cache_dir().to_path_buf(),
        success: true,
    })
}

pub async fn delete(store: ModelStore, model: WhisperModel) -> Value {
    match store.delete(model).await {
        Ok(freed) => to_json(&DeleteReport {
            model,
            deleted: true,
            freed_bytes: freed,
            freed_mb: mb(freed),
            success: true,
        }),
        Err(e) => to_json(
            &FailureReport::new(e.to_string(), ErrorKind::from(&e))
                .with_model(model)
                .not_deleted(),
        ),
    }
}

pub async fn ffmpeg() -> Value {
    match check_ffmpeg().await {
        Ok(info) => to_json(&FfmpegReport {
            available: true,
            path: Some(info.path),
            version: Some(info.version),
            success: true,
        }),
        Err(e) => {
            to_json(&FailureReport::new(e.to_string(), ErrorKind::from(&e)).not_available())
        }
    }
}

/// Load the model (fetching it silently if absent) and transcribe the
/// audio file. Model load and inference both block, so the whole
/// pipeline runs on a worker thread.
pub async fn transcribe(
    store: ModelStore,
    model: WhisperModel,
    audio: PathBuf,
    language: Option<String>,
) -> Result<Transcript, (String, ErrorKind)> {
    debug!("Transcribing {} with model {}", audio.display(), model);
    let loader = WhisperLoader::new(store, Arc::new(HttpFetcher));

    tokio::task::spawn_blocking(move || {
        let mut cache = ModelCache::new(loader);
        let engine = cache
            .acquire(model)
            .map_err(|e| (e.to_string(), ErrorKind::from(&e)))?;
        engine
            .transcribe(&audio, language.as_deref())
            .map_err(|e| (e.to_string(), ErrorKind::from(&e)))
    })
    .await
    .map_err(|e| (format!("Transcription task failed: {e}"), ErrorKind::Load))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ModelStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::with_cache_dir(dir.path().to_path_buf());
        (dir, store)
    }

    #[tokio::test]
    async fn check_reports_missing_model_as_success() {
        let (_dir, store) = store();
        let payload = check(store, WhisperModel::Tiny).await;
        assert_eq!(payload["success"], true);
        assert_eq!(payload["downloaded"], false);
        assert_eq!(payload["model"], "tiny");
    }

    #[tokio::test]
    async fn check_reports_size_for_present_model() {
        let (_dir, store) = store();
        tokio::fs::write(store.model_path(WhisperModel::Tiny), vec![0u8; 1024 * 1024])
            .await
            .unwrap();
        let payload = check(store, WhisperModel::Tiny).await;
        assert_eq!(payload["downloaded"], true);
        assert_eq!(payload["size_bytes"], 1024 * 1024);
        assert_eq!(payload["size_mb"], 1.0);
    }

    #[tokio::test]
    async fn list_covers_all_models_and_cache_dir() {
        let (dir, store) = store();
        let payload = list(store).await;
        assert_eq!(payload["success"], true);
        assert_eq!(payload["models"].as_array().unwrap().len(), 6);
        assert_eq!(
            payload["cache_dir"],
            dir.path().to_string_lossy().as_ref()
        );
    }

    #[tokio::test]
    async fn delete_missing_model_fails_with_kind_but_is_reportable() {
        let (_dir, store) = store();
        let payload = delete(store, WhisperModel::Base).await;
        assert_eq!(payload["success"], false);
        assert_eq!(payload["deleted"], false);
        assert_eq!(payload["error_kind"], "not_found");
        assert_eq!(payload["model"], "base");
    }

    #[tokio::test]
    async fn delete_reports_freed_bytes() {
        let (_dir, store) = store();
        tokio::fs::write(store.model_path(WhisperModel::Base), vec![0u8; 2048])
            .await
            .unwrap();
        let payload = delete(store, WhisperModel::Base).await;
        assert_eq!(payload["success"], true);
        assert_eq!(payload["deleted"], true);
        assert_eq!(payload["freed_bytes"], 2048);
    }
}
