//! Model lifecycle error types

use thiserror::Error;

/// Model lifecycle errors
#[derive(Error, Debug)]
pub enum ModelError {
    /// Model failed to download or load
    #[error("Failed to load model: {0}")]
    LoadFailed(String),

    /// Model not found on disk
    #[error("Model not found: {0}")]
    NotFound(String),

    /// Unknown model identifier
    #[error("Unknown model: {0}. Available: tiny, base, small, medium, large, turbo")]
    UnknownModel(String),

    /// Download interrupted by the user
    #[error("Download interrupted by user")]
    Interrupted,

    /// Checksum mismatch after download
    #[error("Model verification failed: expected {expected}, got {actual}")]
    VerificationFailed { expected: String, actual: String },

    /// Cache directory error
    #[error("Failed to access cache directory: {0}")]
    CacheDirectory(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
