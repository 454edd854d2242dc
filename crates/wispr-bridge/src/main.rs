//! wispr-bridge: single-shot CLI for local whisper transcription and
//! model management.
//!
//! Contract with callers: exactly one JSON object on stdout, logs and
//! `PROGRESS:` lines on stderr. Only a failed transcription exits
//! non-zero; management modes report failure inside the JSON payload
//! and still exit zero.

mod cli;
mod ops;
mod result;

use clap::Parser;
use tracing::debug;

use wispr_models::ModelStore;

use crate::cli::{Cli, Mode, OutputFormat};
use crate::ops::to_json;
use crate::result::{ErrorKind, FailureReport, TranscribeReport};

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();
    debug!("Running mode {:?}", cli.mode);
    let code = run(cli).await;
    std::process::exit(code);
}

fn init_logging() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    // stdout carries the single JSON result; everything else goes to
    // stderr
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("wispr_models=info,wispr_asr=info,wispr_bridge=info")
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> i32 {
    match cli.mode {
        Mode::Transcribe => transcribe_mode(&cli).await,
        Mode::CheckFfmpeg => {
            println!("{}", ops::ffmpeg().await);
            0
        }
        Mode::Download | Mode::Check | Mode::List | Mode::Delete => {
            let payload = match ModelStore::new() {
                Ok(store) => match cli.mode {
                    Mode::Download => ops::download(store, cli.model).await,
                    Mode::Check => ops::check(store, cli.model).await,
                    Mode::List => ops::list(store).await,
                    _ => ops::delete(store, cli.model).await,
                },
                Err(e) => to_json(&FailureReport::new(e.to_string(), ErrorKind::from(&e))),
            };
            println!("{payload}");
            0
        }
    }
}

async fn transcribe_mode(cli: &Cli) -> i32 {
    let audio = match &cli.audio_file {
        Some(path) => path.clone(),
        None => {
            return transcribe_failure(
                cli,
                "No audio file specified".to_string(),
                ErrorKind::Validation,
            )
        }
    };
    if !audio.exists() {
        return transcribe_failure(
            cli,
            format!("File not found: {}", audio.display()),
            ErrorKind::NotFound,
        );
    }

    let store = match ModelStore::new() {
        Ok(store) => store,
        Err(e) => return transcribe_failure(cli, e.to_string(), ErrorKind::from(&e)),
    };

    match ops::transcribe(store, cli.model, audio, cli.language.clone()).await {
        Ok(transcript) => {
            match cli.output_format {
                OutputFormat::Json => println!(
                    "{}",
                    to_json(&TranscribeReport {
                        text: transcript.text,
                        language: transcript.language,
                        success: true,
                    })
                ),
                OutputFormat::Text => println!("{}", transcript.text),
            }
            0
        }
        Err((error, kind)) => transcribe_failure(cli, error, kind),
    }
}

fn transcribe_failure(cli: &Cli, error: String, kind: ErrorKind) -> i32 {
    match cli.output_format {
        OutputFormat::Json => println!("{}", to_json(&FailureReport::new(error, kind))),
        OutputFormat::Text => eprintln!("Error: {error}"),
    }
    1
}
