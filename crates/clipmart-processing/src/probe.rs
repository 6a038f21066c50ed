//! Media prober - duration and thumbnail-frame extraction.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use bytes::Bytes;
use clipmart_core::models::MediaFile;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Duration unavailable: {0}")]
    DurationUnavailable(String),

    #[error("Thumbnail extraction failed: {0}")]
    ThumbnailFailed(String),

    #[error("Probe process failed: {0}")]
    Process(String),
}

/// Probing contract over a decodable media handle.
///
/// Both operations are pure given a consistent input; the pipeline rounds
/// the raw duration before passing it downstream.
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Playable duration in seconds, unrounded.
    async fn probe_duration_secs(&self, file: &MediaFile) -> Result<f64, ProbeError>;

    /// Extract a representative still frame, encoded as a compressed JPEG.
    async fn extract_thumbnail(
        &self,
        file: &MediaFile,
        duration_secs: f64,
    ) -> Result<Bytes, ProbeError>;
}

/// Seek point for the representative frame: early enough to exist in short
/// clips, far enough in to skip leaders.
pub(crate) fn thumbnail_timestamp(duration_secs: f64) -> f64 {
    (duration_secs / 2.0).min(3.0).max(0.0)
}

/// ffprobe/ffmpeg-backed prober.
pub struct FfmpegProber {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl FfmpegProber {
    pub fn new(ffmpeg_path: impl Into<String>, ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    async fn write_temp(
        &self,
        dir: &tempfile::TempDir,
        file: &MediaFile,
    ) -> Result<std::path::PathBuf, ProbeError> {
        let extension = match file.extension() {
            ext if ext.is_empty() => "mp4".to_string(),
            ext => ext,
        };
        let path = dir.path().join(format!("input.{}", extension));
        tokio::fs::write(&path, &file.data)
            .await
            .map_err(|e| ProbeError::Process(format!("Failed to write temp file: {}", e)))?;
        Ok(path)
    }

    async fn ffprobe_json(&self, path: &Path) -> Result<serde_json::Value, ProbeError> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| ProbeError::Process(format!("Failed to execute ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(ProbeError::Process(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| ProbeError::Process(format!("Failed to parse ffprobe output: {}", e)))
    }
}

#[async_trait]
impl MediaProber for FfmpegProber {
    #[tracing::instrument(skip(self, file), fields(file_name = %file.file_name))]
    async fn probe_duration_secs(&self, file: &MediaFile) -> Result<f64, ProbeError> {
        let temp_dir = tempfile::TempDir::new()
            .map_err(|e| ProbeError::Process(format!("Failed to create temp directory: {}", e)))?;
        let path = self.write_temp(&temp_dir, file).await?;

        let probe_data = self.ffprobe_json(&path).await?;

        let duration = probe_data["format"]["duration"]
            .as_str()
            .and_then(|d| d.parse::<f64>().ok())
            .ok_or_else(|| {
                ProbeError::DurationUnavailable("ffprobe reported no numeric duration".to_string())
            })?;

        tracing::debug!(duration_secs = duration, "Duration probed");
        Ok(duration)
    }

    #[tracing::instrument(skip(self, file), fields(file_name = %file.file_name))]
    async fn extract_thumbnail(
        &self,
        file: &MediaFile,
        duration_secs: f64,
    ) -> Result<Bytes, ProbeError> {
        let temp_dir = tempfile::TempDir::new()
            .map_err(|e| ProbeError::Process(format!("Failed to create temp directory: {}", e)))?;
        let input_path = self.write_temp(&temp_dir, file).await?;
        let output_path = temp_dir.path().join("thumbnail.jpg");

        let timestamp = thumbnail_timestamp(duration_secs);

        let output = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .args(["-ss", &format!("{:.3}", timestamp)])
            .arg("-i")
            .arg(&input_path)
            .args(["-frames:v", "1", "-q:v", "3"])
            .arg(&output_path)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ProbeError::Process(format!("Failed to execute ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::ThumbnailFailed(format!(
                "ffmpeg frame extraction failed: {}",
                stderr
            )));
        }

        let bytes = tokio::fs::read(&output_path)
            .await
            .map_err(|e| ProbeError::ThumbnailFailed(format!("No frame written: {}", e)))?;

        tracing::debug!(
            timestamp_secs = timestamp,
            thumbnail_bytes = bytes.len(),
            "Thumbnail frame extracted"
        );
        Ok(bytes.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_timestamp_caps_at_three_seconds() {
        assert_eq!(thumbnail_timestamp(65.7), 3.0);
        assert_eq!(thumbnail_timestamp(6.0), 3.0);
    }

    #[test]
    fn test_thumbnail_timestamp_uses_midpoint_for_short_clips() {
        assert_eq!(thumbnail_timestamp(4.0), 2.0);
        assert_eq!(thumbnail_timestamp(1.0), 0.5);
        assert_eq!(thumbnail_timestamp(0.0), 0.0);
    }
}
