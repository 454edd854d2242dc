//! Audio loading: 16kHz mono f32 samples for the whisper engine

use std::path::Path;

use tracing::{debug, info};

use crate::error::AsrError;
use crate::ffmpeg::ffmpeg_path;

/// Sample rate whisper expects
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Load an audio file and convert it to 16kHz mono f32 samples.
///
/// WAV files are read directly; anything else is decoded through
/// ffmpeg into a scratch WAV first. Blocking, run it on a worker
/// thread.
pub fn load_audio(path: &Path) -> Result<Vec<f32>, AsrError> {
    if !path.exists() {
        return Err(AsrError::FileNotFound(path.display().to_string()));
    }

    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);

    if is_wav {
        load_wav(path)
    } else {
        let decoded = decode_with_ffmpeg(path)?;
        load_wav(decoded.path())
    }
}

fn load_wav(path: &Path) -> Result<Vec<f32>, AsrError> {
    use std::fs::File;
    use std::io::BufReader;

    let file = File::open(path)?;
    let reader = hound::WavReader::new(BufReader::new(file))
        .map_err(|e| AsrError::InvalidAudioFormat(e.to_string()))?;

    let spec = reader.spec();
    debug!(
        "WAV input: {} Hz, {} channel(s), {:?}",
        spec.sample_rate, spec.channels, spec.sample_format
    );

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .filter_map(|s| s.ok())
            .collect(),
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .filter_map(|s| s.ok())
                .map(|s| s as f32 / max_val)
                .collect()
        }
    };

    let mono = downmix(samples, spec.channels);
    Ok(resample(mono, spec.sample_rate))
}

/// Average interleaved channels into mono
fn downmix(samples: Vec<f32>, channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples;
    }
    let channels = channels as usize;
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Linear-interpolation resample to the target rate
fn resample(samples: Vec<f32>, source_rate: u32) -> Vec<f32> {
    if source_rate == TARGET_SAMPLE_RATE {
        return samples;
    }

    let ratio = TARGET_SAMPLE_RATE as f64 / source_rate as f64;
    let new_len = (samples.len() as f64 * ratio) as usize;
    let mut resampled = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let src_idx = i as f64 / ratio;
        let src_idx_floor = src_idx.floor() as usize;
        let frac = (src_idx - src_idx_floor as f64) as f32;

        let s0 = samples.get(src_idx_floor).copied().unwrap_or(0.0);
        let s1 = samples.get(src_idx_floor + 1).copied().unwrap_or(s0);
        resampled.push(s0 + (s1 - s0) * frac);
    }

    resampled
}

/// Decode a non-WAV file into a scratch 16kHz mono WAV via ffmpeg
fn decode_with_ffmpeg(path: &Path) -> Result<tempfile::NamedTempFile, AsrError> {
    let scratch = tempfile::Builder::new()
        .prefix("wispr-audio-")
        .suffix(".wav")
        .tempfile()?;

    info!("Decoding {} via ffmpeg", path.display());
    let output = std::process::Command::new(ffmpeg_path())
        .arg("-y")
        .arg("-i")
        .arg(path)
        .arg("-ar")
        .arg(TARGET_SAMPLE_RATE.to_string())
        .arg("-ac")
        .arg("1")
        .arg("-f")
        .arg("wav")
        .arg(scratch.path())
        .output()
        .map_err(|_| AsrError::FfmpegNotFound)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AsrError::FfmpegFailed(
            stderr.lines().last().unwrap_or("unknown error").to_string(),
        ));
    }

    Ok(scratch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_wav(dir: &tempfile::TempDir, channels: u16, sample_rate: u32, frames: usize) -> PathBuf {
        let path = dir.path().join("input.wav");
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..frames {
            for _ in 0..channels {
                writer.write_sample(((i % 100) as i16) * 100).unwrap();
            }
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn missing_file_is_a_typed_error() {
        let err = load_audio(Path::new("/nonexistent/clip.wav")).unwrap_err();
        assert!(matches!(err, AsrError::FileNotFound(_)));
    }

    #[test]
    fn mono_wav_at_target_rate_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_wav(&dir, 1, TARGET_SAMPLE_RATE, 1600);
        let samples = load_audio(&path).unwrap();
        assert_eq!(samples.len(), 1600);
        assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn stereo_wav_is_downmixed_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_wav(&dir, 2, TARGET_SAMPLE_RATE, 800);
        let samples = load_audio(&path).unwrap();
        assert_eq!(samples.len(), 800);
    }

    #[test]
    fn downmix_averages_frames() {
        let mono = downmix(vec![1.0, 0.0, 0.5, 0.5], 2);
        assert_eq!(mono, vec![0.5, 0.5]);
    }

    #[test]
    fn wav_is_resampled_to_target_rate() {
        let dir = tempfile::tempdir().unwrap();
        // One second at 8kHz becomes one second at 16kHz
        let path = write_wav(&dir, 1, 8000, 8000);
        let samples = load_audio(&path).unwrap();
        assert_eq!(samples.len(), TARGET_SAMPLE_RATE as usize);
    }

    #[test]
    fn resample_is_identity_at_target_rate() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(samples.clone(), TARGET_SAMPLE_RATE), samples);
    }

    #[test]
    fn garbage_wav_is_invalid_format_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.wav");
        std::fs::write(&path, b"not a wav file at all").unwrap();
        let err = load_audio(&path).unwrap_err();
        assert!(matches!(err, AsrError::InvalidAudioFormat(_)));
    }
}
