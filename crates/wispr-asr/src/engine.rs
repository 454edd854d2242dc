//! Whisper transcription engine using whisper-rs

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use wispr_models::{descriptor, ModelError, ModelFetcher, ModelLoader, ModelStore, WhisperModel};

use crate::audio::load_audio;
use crate::error::AsrError;

/// Transcription result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub language: String,
}

/// A loaded whisper model ready to transcribe
pub struct WhisperEngine {
    model: WhisperModel,
    context: WhisperContext,
}

impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperEngine")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl WhisperEngine {
    /// Load a model file into memory. Takes seconds for the larger
    /// models; blocking.
    pub fn load(model: WhisperModel, path: &Path) -> Result<Self, AsrError> {
        if !path.exists() {
            return Err(AsrError::FileNotFound(path.display().to_string()));
        }

        info!("Loading whisper model {} from {}", model, path.display());
        let context = WhisperContext::new_with_params(
            &path.to_string_lossy(),
            WhisperContextParameters::default(),
        )
        .map_err(|e| AsrError::ModelLoadFailed(e.to_string()))?;

        Ok(Self { model, context })
    }

    pub fn model(&self) -> WhisperModel {
        self.model
    }

    /// Transcribe an audio file. Decodes the audio, then runs whisper
    /// over it; blocking.
    ///
    /// With no language given, whisper auto-detects and the detected
    /// code is returned; detection failure degrades to `"unknown"`.
    pub fn transcribe(&self, audio_path: &Path, language: Option<&str>) -> Result<Transcript, AsrError> {
        let samples = load_audio(audio_path)?;
        debug!(
            "Transcribing {} ({:.1}s of audio) with model {}",
            audio_path.display(),
            samples.len() as f64 / 16000.0,
            self.model
        );
        self.transcribe_samples(&samples, language)
    }

    fn transcribe_samples(
        &self,
        samples: &[f32],
        language: Option<&str>,
    ) -> Result<Transcript, AsrError> {
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(language.unwrap_or("auto")));
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_special(false);
        params.set_print_timestamps(false);

        let mut state = self
            .context
            .create_state()
            .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))?;

        state
            .full(params, samples)
            .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))?;

        let num_segments = state
            .full_n_segments()
            .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))?;

        let mut text = String::new();
        for i in 0..num_segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))?;
            text.push_str(&segment);
        }

        let language = match language {
            Some(lang) => lang.to_string(),
            None => state
                .full_lang_id_from_state()
                .ok()
                .and_then(whisper_rs::get_lang_str)
                .unwrap_or("unknown")
                .to_string(),
        };

        info!("Transcription complete ({} segments)", num_segments);
        Ok(Transcript {
            text: text.trim().to_string(),
            language,
        })
    }
}

/// Loads whisper engines for the model cache, fetching the model file
/// first when it is not on disk.
///
/// Fetches made here are silent: progress events belong to the explicit
/// download operation, not to transcription.
pub struct WhisperLoader {
    store: ModelStore,
    fetcher: Arc<dyn ModelFetcher>,
}

impl WhisperLoader {
    pub fn new(store: ModelStore, fetcher: Arc<dyn ModelFetcher>) -> Self {
        Self { store, fetcher }
    }
}

impl ModelLoader for WhisperLoader {
    type Model = WhisperEngine;

    fn load(&self, model: WhisperModel) -> Result<WhisperEngine, ModelError> {
        let path = self.store.model_path(model);
        if !path.exists() {
            info!("Model {} not on disk, fetching before load", model);
            self.fetcher.fetch(&descriptor(model), &path)?;
        }
        WhisperEngine::load(model, &path).map_err(|e| ModelError::LoadFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use wispr_models::ModelDescriptor;

    struct FailingFetcher;

    impl ModelFetcher for FailingFetcher {
        fn fetch(&self, _desc: &ModelDescriptor, _dest: &Path) -> Result<(), ModelError> {
            Err(ModelError::LoadFailed("no network in tests".to_string()))
        }
    }

    #[test]
    fn engine_load_rejects_missing_file() {
        let err = WhisperEngine::load(WhisperModel::Tiny, Path::new("/nonexistent/model.bin"))
            .unwrap_err();
        assert!(matches!(err, AsrError::FileNotFound(_)));
    }

    #[test]
    fn engine_load_rejects_garbage_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ggml-tiny.bin");
        std::fs::write(&path, b"definitely not a ggml model").unwrap();
        let err = WhisperEngine::load(WhisperModel::Tiny, &path).unwrap_err();
        assert!(matches!(err, AsrError::ModelLoadFailed(_)));
    }

    #[test]
    fn loader_propagates_fetch_failure_for_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::with_cache_dir(PathBuf::from(dir.path()));
        let loader = WhisperLoader::new(store, Arc::new(FailingFetcher));
        let err = loader.load(WhisperModel::Tiny).unwrap_err();
        assert!(matches!(err, ModelError::LoadFailed(_)));
    }
}
