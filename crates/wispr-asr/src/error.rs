//! ASR error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AsrError {
    #[error("Model load failed: {0}")]
    ModelLoadFailed(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid audio format: {0}")]
    InvalidAudioFormat(String),

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFmpeg check timed out")]
    FfmpegTimeout,

    #[error("FFmpeg failed: {0}")]
    FfmpegFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
