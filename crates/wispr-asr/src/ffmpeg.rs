//! FFmpeg discovery and health check

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AsrError;

/// Environment overrides consulted before falling back to PATH lookup,
/// in priority order
const ENV_OVERRIDES: [&str; 3] = ["FFMPEG_PATH", "FFMPEG_EXECUTABLE", "FFMPEG_BINARY"];

const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a successful ffmpeg health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FfmpegInfo {
    pub path: PathBuf,
    pub version: String,
}

/// Resolve the ffmpeg executable to invoke.
///
/// The first environment override that names an existing file wins; an
/// override pointing at a missing file is skipped rather than fatal.
/// With no usable override the bare name is returned and PATH lookup
/// applies at spawn time.
pub fn ffmpeg_path() -> PathBuf {
    for var in ENV_OVERRIDES {
        if let Ok(value) = std::env::var(var) {
            if !value.is_empty() && Path::new(&value).exists() {
                debug!("Using ffmpeg from {}: {}", var, value);
                return PathBuf::from(value);
            }
        }
    }
    PathBuf::from("ffmpeg")
}

/// Probe ffmpeg by running `-version`, with a bounded wait
pub async fn check_ffmpeg() -> Result<FfmpegInfo, AsrError> {
    let path = ffmpeg_path();
    let output = tokio::time::timeout(
        CHECK_TIMEOUT,
        tokio::process::Command::new(&path).arg("-version").output(),
    )
    .await
    .map_err(|_| AsrError::FfmpegTimeout)?
    .map_err(|_| AsrError::FfmpegNotFound)?;

    if !output.status.success() {
        return Err(AsrError::FfmpegFailed(format!(
            "ffmpeg -version exited with {}",
            output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version = stdout.lines().next().unwrap_or("").trim().to_string();
    info!("FFmpeg available at {}: {}", path.display(), version);

    Ok(FfmpegInfo { path, version })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment mutation is process-global, so every env-dependent
    // case lives in one test
    #[test]
    fn resolution_prefers_first_existing_override() {
        for var in ENV_OVERRIDES {
            std::env::remove_var(var);
        }
        assert_eq!(ffmpeg_path(), PathBuf::from("ffmpeg"));

        // A missing file is skipped
        std::env::set_var("FFMPEG_PATH", "/nonexistent/ffmpeg");
        assert_eq!(ffmpeg_path(), PathBuf::from("ffmpeg"));

        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("ffmpeg");
        std::fs::write(&fake, b"").unwrap();

        // A lower-priority existing override wins over a missing
        // higher-priority one
        std::env::set_var("FFMPEG_BINARY", &fake);
        assert_eq!(ffmpeg_path(), fake);

        // A higher-priority existing override takes precedence
        let preferred = dir.path().join("ffmpeg-preferred");
        std::fs::write(&preferred, b"").unwrap();
        std::env::set_var("FFMPEG_PATH", &preferred);
        assert_eq!(ffmpeg_path(), preferred);

        for var in ENV_OVERRIDES {
            std::env::remove_var(var);
        }
    }
}
