//! Command-line interface definition

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use wispr_models::WhisperModel;

/// Single-shot bridge to local whisper transcription and model
/// management. Runs one operation, prints one JSON result on stdout,
/// and exits; progress streams as `PROGRESS:` lines on stderr.
#[derive(Debug, Parser)]
#[command(name = "wispr-bridge", version)]
pub struct Cli {
    /// Operation to perform
    #[arg(long, value_enum, default_value_t = Mode::Transcribe)]
    pub mode: Mode,

    /// Audio file to transcribe (transcribe mode only)
    pub audio_file: Option<PathBuf>,

    /// Whisper model to use
    #[arg(long, default_value = "base")]
    pub model: WhisperModel,

    /// Language code hint; omitted means auto-detect
    #[arg(long)]
    pub language: Option<String>,

    /// How to print a transcription result
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Transcribe,
    Download,
    Check,
    List,
    Delete,
    CheckFfmpeg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_json_transcribe_with_base_model() {
        let cli = Cli::parse_from(["wispr-bridge", "clip.wav"]);
        assert_eq!(cli.mode, Mode::Transcribe);
        assert_eq!(cli.model, WhisperModel::Base);
        assert_eq!(cli.output_format, OutputFormat::Json);
        assert_eq!(cli.audio_file, Some(PathBuf::from("clip.wav")));
        assert!(cli.language.is_none());
    }

    #[test]
    fn parses_management_modes_without_audio_file() {
        let cli = Cli::parse_from(["wispr-bridge", "--mode", "download", "--model", "small"]);
        assert_eq!(cli.mode, Mode::Download);
        assert_eq!(cli.model, WhisperModel::Small);
        assert!(cli.audio_file.is_none());
    }

    #[test]
    fn check_ffmpeg_mode_is_kebab_case() {
        let cli = Cli::parse_from(["wispr-bridge", "--mode", "check-ffmpeg"]);
        assert_eq!(cli.mode, Mode::CheckFfmpeg);
    }

    #[test]
    fn rejects_unknown_model_name() {
        let result = Cli::try_parse_from(["wispr-bridge", "--model", "enormous"]);
        assert!(result.is_err());
    }

    #[test]
    fn accepts_language_hint() {
        let cli = Cli::parse_from(["wispr-bridge", "--language", "de", "clip.mp3"]);
        assert_eq!(cli.language.as_deref(), Some("de"));
    }
}
