//! wispr-models - Whisper model lifecycle management
//!
//! This crate owns the model catalog, the on-disk model store, a bounded
//! in-memory cache of loaded models, and the download orchestration with
//! its polling progress estimator.

pub mod cache;
pub mod download;
pub mod error;
pub mod progress;
pub mod registry;
pub mod store;

pub use cache::{ModelCache, ModelLoader, MAX_CACHED};
pub use download::{DownloadOutcome, Downloader, HttpFetcher, ModelFetcher};
pub use error::ModelError;
pub use progress::{DownloadMonitor, ProgressEvent};
pub use registry::{descriptor, ModelDescriptor, WhisperModel};
pub use store::{ModelStatus, ModelStore};
