//! Local speech-to-text: audio decoding and whisper transcription

pub mod audio;
pub mod engine;
pub mod error;
pub mod ffmpeg;

pub use audio::load_audio;
pub use engine::{Transcript, WhisperEngine, WhisperLoader};
pub use error::AsrError;
pub use ffmpeg::{check_ffmpeg, ffmpeg_path, FfmpegInfo};
