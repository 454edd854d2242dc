//! JSON result payloads printed on stdout

use std::path::PathBuf;

use serde::Serialize;

use wispr_asr::AsrError;
use wispr_models::{ModelError, ModelStatus, WhisperModel};

const MB: f64 = 1024.0 * 1024.0;

/// Bytes as megabytes, rounded to one decimal
pub fn mb(bytes: u64) -> f64 {
    (bytes as f64 / MB * 10.0).round() / 10.0
}

/// Closed classification of failures, carried alongside the message so
/// callers never have to parse error strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Load,
    NotFound,
    Io,
    Timeout,
    Interrupted,
    Validation,
}

impl From<&ModelError> for ErrorKind {
    fn from(e: &ModelError) -> Self {
        match e {
            ModelError::LoadFailed(_) => ErrorKind::Load,
            ModelError::NotFound(_) => ErrorKind::NotFound,
            ModelError::UnknownModel(_) => ErrorKind::Validation,
            ModelError::Interrupted => ErrorKind::Interrupted,
            ModelError::VerificationFailed { .. } => ErrorKind::Validation,
            ModelError::CacheDirectory(_) => ErrorKind::Io,
            ModelError::Io(_) => ErrorKind::Io,
            ModelError::Http(e) if e.is_timeout() => ErrorKind::Timeout,
            ModelError::Http(_) => ErrorKind::Load,
        }
    }
}

impl From<&AsrError> for ErrorKind {
    fn from(e: &AsrError) -> Self {
        match e {
            AsrError::ModelLoadFailed(_) => ErrorKind::Load,
            AsrError::FileNotFound(_) => ErrorKind::NotFound,
            AsrError::InvalidAudioFormat(_) => ErrorKind::Validation,
            AsrError::TranscriptionFailed(_) => ErrorKind::Load,
            AsrError::FfmpegNotFound => ErrorKind::NotFound,
            AsrError::FfmpegTimeout => ErrorKind::Timeout,
            AsrError::FfmpegFailed(_) => ErrorKind::Load,
            AsrError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Download result
#[derive(Debug, Serialize)]
pub struct DownloadReport {
    pub model: WhisperModel,
    pub downloaded: bool,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub size_mb: f64,
    pub success: bool,
}

/// Check result for a single model
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub model: WhisperModel,
    pub downloaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_mb: Option<f64>,
    pub success: bool,
}

impl From<ModelStatus> for CheckReport {
    fn from(status: ModelStatus) -> Self {
        Self {
            model: status.model,
            downloaded: status.downloaded,
            path: status.path,
            size_mb: status.size_bytes.map(mb),
            size_bytes: status.size_bytes,
            success: true,
        }
    }
}

/// Per-model entry in a list result
#[derive(Debug, Serialize)]
pub struct ListEntry {
    pub model: WhisperModel,
    pub downloaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_mb: Option<f64>,
}

impl From<ModelStatus> for ListEntry {
    fn from(status: ModelStatus) -> Self {
        Self {
            model: status.model,
            downloaded: status.downloaded,
            path: status.path,
            size_mb: status.size_bytes.map(mb),
            size_bytes: status.size_bytes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListReport {
    pub models: Vec<ListEntry>,
    pub cache_dir: PathBuf,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteReport {
    pub model: WhisperModel,
    pub deleted: bool,
    pub freed_bytes: u64,
    pub freed_mb: f64,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct TranscribeReport {
    pub text: String,
    pub language: String,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct FfmpegReport {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub success: bool,
}

/// Failure payload, shared by every mode. The mode-specific negative
/// flag (`downloaded: false`, `deleted: false`, ...) is set by the
/// operation that failed.
#[derive(Debug, Serialize)]
pub struct FailureReport {
    pub error: String,
    pub error_kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<WhisperModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloaded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    pub success: bool,
}

impl FailureReport {
    pub fn new(error: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            error: error.into(),
            error_kind: kind,
            model: None,
            downloaded: None,
            deleted: None,
            available: None,
            success: false,
        }
    }

    pub fn with_model(mut self, model: WhisperModel) -> Self {
        self.model = Some(model);
        self
    }

    pub fn not_downloaded(mut self) -> Self {
        self.downloaded = Some(false);
        self
    }

    pub fn not_deleted(mut self) -> Self {
        self.deleted = Some(false);
        self
    }

    pub fn not_available(mut self) -> Self {
        self.available = Some(false);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mb_rounds_to_one_decimal() {
        assert_eq!(mb(0), 0.0);
        assert_eq!(mb(1024 * 1024), 1.0);
        assert_eq!(mb(150 * 1024 * 1024 + 512 * 1024), 150.5);
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::NotFound).unwrap();
        assert_eq!(json, "\"not_found\"");
    }

    #[test]
    fn model_errors_map_to_stable_kinds() {
        assert_eq!(
            ErrorKind::from(&ModelError::NotFound("tiny".to_string())),
            ErrorKind::NotFound
        );
        assert_eq!(ErrorKind::from(&ModelError::Interrupted), ErrorKind::Interrupted);
        assert_eq!(
            ErrorKind::from(&ModelError::UnknownModel("enormous".to_string())),
            ErrorKind::Validation
        );
    }

    #[test]
    fn asr_errors_map_to_stable_kinds() {
        assert_eq!(ErrorKind::from(&AsrError::FfmpegTimeout), ErrorKind::Timeout);
        assert_eq!(
            ErrorKind::from(&AsrError::FileNotFound("clip.wav".to_string())),
            ErrorKind::NotFound
        );
        assert_eq!(
            ErrorKind::from(&AsrError::InvalidAudioFormat("bad header".to_string())),
            ErrorKind::Validation
        );
    }

    #[test]
    fn check_report_omits_absent_fields() {
        let report = CheckReport::from(ModelStatus {
            model: WhisperModel::Tiny,
            downloaded: false,
            path: None,
            size_bytes: None,
        });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["downloaded"], false);
        assert_eq!(json["success"], true);
        assert!(json.get("path").is_none());
        assert!(json.get("size_bytes").is_none());
        assert!(json.get("size_mb").is_none());
    }

    #[test]
    fn failure_report_carries_mode_flag() {
        let report = FailureReport::new("Model not downloaded: tiny", ErrorKind::NotFound)
            .with_model(WhisperModel::Tiny)
            .not_deleted();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error_kind"], "not_found");
        assert_eq!(json["deleted"], false);
        assert_eq!(json["model"], "tiny");
        assert!(json.get("downloaded").is_none());
    }
}
