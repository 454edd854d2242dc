//! Model catalog: identifiers, remote sources and size fallbacks

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

const MB: u64 = 1024 * 1024;

/// The fixed set of whisper model identifiers the bridge accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhisperModel {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
    Turbo,
}

impl WhisperModel {
    /// All models, in catalog order
    pub const ALL: [WhisperModel; 6] = [
        WhisperModel::Tiny,
        WhisperModel::Base,
        WhisperModel::Small,
        WhisperModel::Medium,
        WhisperModel::Large,
        WhisperModel::Turbo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WhisperModel::Tiny => "tiny",
            WhisperModel::Base => "base",
            WhisperModel::Small => "small",
            WhisperModel::Medium => "medium",
            WhisperModel::Large => "large",
            WhisperModel::Turbo => "turbo",
        }
    }
}

impl fmt::Display for WhisperModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WhisperModel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WhisperModel::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ModelError::UnknownModel(s.to_string()))
    }
}

/// Download descriptor for a model. Immutable, derived from the
/// identifier per call and never persisted.
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    /// Model identifier
    pub model: WhisperModel,
    /// Remote source URL
    pub url: &'static str,
    /// Approximate size in bytes, used when the remote size probe fails
    pub approx_bytes: u64,
    /// Expected SHA256 digest, verified after download when present
    pub sha256: Option<&'static str>,
}

impl ModelDescriptor {
    /// File name under the cache directory (the URL basename, which is
    /// the model provider's naming convention)
    pub fn filename(&self) -> &'static str {
        self.url.rsplit('/').next().unwrap_or(self.url)
    }
}

/// Get the download descriptor for a model
pub fn descriptor(model: WhisperModel) -> ModelDescriptor {
    let (url, approx_bytes) = match model {
        WhisperModel::Tiny => (
            "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-tiny.bin",
            75 * MB,
        ),
        WhisperModel::Base => (
            "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-base.bin",
            142 * MB,
        ),
        WhisperModel::Small => (
            "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-small.bin",
            466 * MB,
        ),
        WhisperModel::Medium => (
            "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-medium.bin",
            1500 * MB,
        ),
        WhisperModel::Large => (
            "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v3.bin",
            3100 * MB,
        ),
        WhisperModel::Turbo => (
            "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v3-turbo.bin",
            1600 * MB,
        ),
    };

    ModelDescriptor {
        model,
        url,
        approx_bytes,
        sha256: None,
    }
}
