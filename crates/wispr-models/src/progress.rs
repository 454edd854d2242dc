//! Download progress estimation by filesystem polling
//!
//! The download collaborator exposes no callbacks, so progress is
//! inferred from the outside: the destination file's size is sampled on
//! a fixed interval and throughput is derived from its growth.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

use crate::registry::WhisperModel;

/// Interval between file-size samples
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Minimum time between emitted progress events
const EMIT_INTERVAL: Duration = Duration::from_millis(500);

/// Percentage movement that forces an emission regardless of elapsed time
const EMIT_PERCENT_DELTA: f64 = 1.0;

/// Number of instantaneous throughput samples in the rolling mean
const SPEED_WINDOW: usize = 10;

/// Fraction of the expected size treated as completion; tolerates slop
/// in the size estimate
const NEAR_COMPLETE: f64 = 0.95;

/// Fraction above which a stalled download is declared done
const STALL_COMPLETE: f64 = 0.9;

/// Time without growth before the stall heuristic applies
const STALL_TIMEOUT: Duration = Duration::from_secs(10);

/// One-way progress side-channel events. Ordered, append-only; the
/// producer never reads them back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Progress {
        model: WhisperModel,
        downloaded_bytes: u64,
        total_bytes: u64,
        percentage: f64,
        speed_mbps: f64,
    },
    Complete {
        model: WhisperModel,
        downloaded_bytes: u64,
        total_bytes: u64,
        percentage: f64,
    },
}

impl ProgressEvent {
    pub fn percentage(&self) -> f64 {
        match self {
            ProgressEvent::Progress { percentage, .. }
            | ProgressEvent::Complete { percentage, .. } => *percentage,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ProgressEvent::Complete { .. })
    }
}

/// Rolling window of instantaneous throughput samples, reported as an
/// arithmetic-mean speed in Mbps
#[derive(Debug, Default)]
pub(crate) struct SpeedWindow {
    samples: VecDeque<f64>,
    smoothed: f64,
}

impl SpeedWindow {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record one growth observation
    pub(crate) fn record(&mut self, grown_bytes: u64, elapsed: Duration) {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return;
        }
        let mbps = (grown_bytes as f64 / secs) * 8.0 / (1024.0 * 1024.0);
        self.samples.push_back(mbps);
        if self.samples.len() > SPEED_WINDOW {
            self.samples.pop_front();
        }
        self.smoothed = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
    }

    /// Smoothed speed; holds the last value while the file is not
    /// growing (negative growth is never interpolated)
    pub(crate) fn smoothed(&self) -> f64 {
        self.smoothed
    }
}

/// Completion percentage, clamped to [0, 100]. A zero expected size
/// reports 0 rather than dividing by it.
pub(crate) fn percent_of(current: u64, expected: u64) -> f64 {
    if expected == 0 {
        return 0.0;
    }
    (current as f64 / expected as f64 * 100.0).min(100.0)
}

/// Throttle decision: emit when nothing has been emitted yet, when the
/// emission interval has elapsed, or when the percentage moved by more
/// than a full point since the last emission
fn emission_due(last_emit: Option<(Instant, f64)>, now: Instant, percentage: f64) -> bool {
    match last_emit {
        None => true,
        Some((at, pct)) => {
            now.duration_since(at) > EMIT_INTERVAL || (percentage - pct).abs() > EMIT_PERCENT_DELTA
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Background observer for one download.
///
/// Polls the destination file until cancelled or the transfer looks
/// done. Termination is heuristic by design: reaching 95% of the
/// expected size counts as done, and a download that stops growing for
/// ten seconds past 90% is treated as finished rather than stuck.
pub struct DownloadMonitor {
    model: WhisperModel,
    path: PathBuf,
    expected_bytes: u64,
    cancel: Arc<AtomicBool>,
    poll_interval: Duration,
}

impl DownloadMonitor {
    pub fn new(
        model: WhisperModel,
        path: PathBuf,
        expected_bytes: u64,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            model,
            path,
            expected_bytes,
            cancel,
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run the sampling loop, pushing throttled events into `on_event`.
    ///
    /// Events are throttled to one per poll interval unless the
    /// percentage moved by more than a full point, which bounds event
    /// volume on fast links while staying responsive on slow ones.
    pub async fn run<F>(self, on_event: F)
    where
        F: Fn(&ProgressEvent) + Send + 'static,
    {
        let mut window = SpeedWindow::new();
        let mut last_size: u64 = 0;
        let mut last_sample = Instant::now();
        let mut last_growth = Instant::now();
        let mut last_emit: Option<(Instant, f64)> = None;

        loop {
            if self.cancel.load(Ordering::Relaxed) {
                debug!("Progress monitor for {} cancelled", self.model);
                return;
            }

            // A briefly unreadable file (e.g. not created yet) counts as
            // a zero-growth sample, never as an error
            let current = tokio::fs::metadata(&self.path)
                .await
                .map(|m| m.len())
                .unwrap_or(0);
            let now = Instant::now();

            if current > last_size {
                window.record(current - last_size, now - last_sample);
                last_growth = now;
            }

            let percentage = percent_of(current, self.expected_bytes);
            if emission_due(last_emit, now, percentage) {
                on_event(&ProgressEvent::Progress {
                    model: self.model,
                    downloaded_bytes: current,
                    total_bytes: self.expected_bytes,
                    percentage: round1(percentage),
                    speed_mbps: round2(window.smoothed()),
                });
                last_emit = Some((now, percentage));
            }

            if current as f64 >= self.expected_bytes as f64 * NEAR_COMPLETE {
                debug!(
                    "Monitor for {} stopping at {} of {} bytes",
                    self.model, current, self.expected_bytes
                );
                return;
            }
            if now.duration_since(last_growth) > STALL_TIMEOUT
                && current as f64 > self.expected_bytes as f64 * STALL_COMPLETE
            {
                debug!("Monitor for {} stopping: stalled near completion", self.model);
                return;
            }

            last_size = current;
            last_sample = now;
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
