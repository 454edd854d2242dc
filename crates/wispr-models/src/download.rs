//! Download orchestration: an opaque blocking fetch observed by a
//! concurrent progress monitor

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::ModelError;
use crate::progress::{DownloadMonitor, ProgressEvent, POLL_INTERVAL};
use crate::registry::{descriptor, ModelDescriptor, WhisperModel};
use crate::store::ModelStore;

/// Timeout for the remote size probe
const SIZE_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounded wait for the monitor to acknowledge cancellation
const MONITOR_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Timeout for the blocking transfer itself; models are large
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Blocking download collaborator.
///
/// Implementations must write `dest` incrementally as bytes arrive: the
/// progress monitor's only view of the transfer is that file's size.
/// No progress callbacks, no resume.
pub trait ModelFetcher: Send + Sync {
    fn fetch(&self, desc: &ModelDescriptor, dest: &Path) -> Result<(), ModelError>;
}

/// Fetcher that streams the model over HTTP straight to the
/// destination file
pub struct HttpFetcher;

impl ModelFetcher for HttpFetcher {
    fn fetch(&self, desc: &ModelDescriptor, dest: &Path) -> Result<(), ModelError> {
        let result = self.fetch_inner(desc, dest);
        if result.is_err() {
            // Never leave a partial file behind
            let _ = std::fs::remove_file(dest);
        }
        result
    }
}

impl HttpFetcher {
    fn fetch_inner(&self, desc: &ModelDescriptor, dest: &Path) -> Result<(), ModelError> {
        use std::io::{Read, Write};

        info!("Downloading model {} from {}", desc.model, desc.url);

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;
        let mut response = client.get(desc.url).send()?;
        if !response.status().is_success() {
            return Err(ModelError::LoadFailed(format!(
                "HTTP {} fetching {}",
                response.status(),
                desc.url
            )));
        }

        let mut file = std::fs::File::create(dest)?;
        let mut buffer = [0u8; 8192];
        loop {
            let read = response.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            file.write_all(&buffer[..read])?;
        }
        file.flush()?;
        drop(file);

        if let Some(expected) = desc.sha256 {
            debug!("Verifying checksum for {}", desc.model);
            let actual = sha256_of(dest)?;
            if actual != expected {
                return Err(ModelError::VerificationFailed {
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        info!("Model {} downloaded", desc.model);
        Ok(())
    }
}

fn sha256_of(path: &Path) -> Result<String, ModelError> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

/// Outcome of a completed (or short-circuited) download
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub model: WhisperModel,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Orchestrates one model download: resolves the expected size, runs the
/// blocking fetch under a worker thread, and reconciles the concurrent
/// progress monitor's lifecycle on every exit path.
pub struct Downloader {
    store: ModelStore,
    fetcher: Arc<dyn ModelFetcher>,
    probe: reqwest::Client,
    poll_interval: Duration,
}

impl Downloader {
    pub fn new(store: ModelStore) -> Result<Self, ModelError> {
        Self::with_fetcher(store, Arc::new(HttpFetcher))
    }

    pub fn with_fetcher(
        store: ModelStore,
        fetcher: Arc<dyn ModelFetcher>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            store,
            fetcher,
            probe: reqwest::Client::builder()
                .timeout(SIZE_PROBE_TIMEOUT)
                .build()?,
            poll_interval: POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Expected byte size for a model: a header-only probe against the
    /// remote source, falling back to the catalog's approximate size.
    /// Progress reporting degrades gracefully offline instead of
    /// failing, so this never errors.
    pub async fn resolve_expected_size(&self, model: WhisperModel) -> u64 {
        let desc = descriptor(model);
        match self.probe.head(desc.url).send().await {
            Ok(response) if response.status().is_success() => {
                let length = response
                    .headers()
                    .get(reqwest::header::CONTENT_LENGTH)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok());
                if let Some(length) = length {
                    if length > 0 {
                        debug!("Remote size for {}: {} bytes", model, length);
                        return length;
                    }
                }
            }
            Ok(response) => {
                debug!("Size probe for {} returned {}", model, response.status())
            }
            Err(e) => debug!("Size probe for {} failed: {}", model, e),
        }
        debug!("Using approximate size for {}", model);
        desc.approx_bytes
    }

    /// Download a model, emitting throttled progress events and exactly
    /// one terminal `complete` event on success.
    ///
    /// An already-present file short-circuits: no monitor is spawned and
    /// no events are emitted.
    pub async fn download<F>(
        &self,
        model: WhisperModel,
        on_event: F,
    ) -> Result<DownloadOutcome, ModelError>
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        let dest = self.store.model_path(model);
        if let Ok(meta) = tokio::fs::metadata(&dest).await {
            info!("Model {} already downloaded", model);
            return Ok(DownloadOutcome {
                model,
                path: dest,
                size_bytes: meta.len(),
            });
        }

        let expected = self.resolve_expected_size(model).await;
        self.download_with_expected(model, expected, on_event).await
    }

    pub(crate) async fn download_with_expected<F>(
        &self,
        model: WhisperModel,
        expected: u64,
        on_event: F,
    ) -> Result<DownloadOutcome, ModelError>
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        let dest = self.store.model_path(model);
        tokio::fs::create_dir_all(self.store.cache_dir()).await?;

        let on_event = Arc::new(on_event);
        let cancel = Arc::new(AtomicBool::new(false));
        let monitor = DownloadMonitor::new(model, dest.clone(), expected, cancel.clone())
            .with_poll_interval(self.poll_interval);
        let sink = on_event.clone();
        let monitor_task = tokio::spawn(monitor.run(move |event| sink(event)));

        let fetcher = self.fetcher.clone();
        let desc = descriptor(model);
        let fetch_dest = dest.clone();
        let fetch_task = tokio::task::spawn_blocking(move || fetcher.fetch(&desc, &fetch_dest));

        let fetched: Result<(), ModelError> = tokio::select! {
            joined = fetch_task => match joined {
                Ok(result) => result,
                Err(e) => Err(ModelError::LoadFailed(format!("Download task failed: {e}"))),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Download of {} interrupted", model);
                Err(ModelError::Interrupted)
            }
        };

        // Shut the monitor down before deciding the outcome: nothing may
        // be emitted concurrently with, or after, the terminal event
        cancel.store(true, Ordering::Relaxed);
        if tokio::time::timeout(MONITOR_JOIN_TIMEOUT, monitor_task)
            .await
            .is_err()
        {
            warn!(
                "Progress monitor for {} did not stop within {:?}",
                model, MONITOR_JOIN_TIMEOUT
            );
        }

        fetched?;

        let size_bytes = tokio::fs::metadata(&dest)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        on_event(&ProgressEvent::Complete {
            model,
            downloaded_bytes: size_bytes,
            total_bytes: expected,
            percentage: 100.0,
        });

        Ok(DownloadOutcome {
            model,
            path: dest,
            size_bytes,
        })
    }
}
