//! Shared container transform engine.
//!
//! The engine rewrites media containers without re-encoding. Initialization
//! (an ffmpeg availability probe) is expensive enough to memoize: the handle
//! wraps an injected engine with single-flight, process-wide initialization,
//! so the first caller pays and concurrent first callers await the same run.

use std::process::Stdio;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use clipmart_core::models::MediaFile;
use tokio::process::Command;
use tokio::sync::OnceCell;

/// Container rewrite contract.
#[async_trait]
pub trait TransformEngine: Send + Sync {
    /// One-time setup; the handle guarantees at most one concurrent run.
    async fn initialize(&self) -> Result<()>;

    /// Rewrite the container with its metadata atoms dropped, no re-encode.
    async fn strip_container_metadata(&self, file: &MediaFile) -> Result<MediaFile>;
}

/// Injected, reference-counted engine handle with single-flight initialization.
pub struct TransformEngineHandle {
    engine: Arc<dyn TransformEngine>,
    init: OnceCell<()>,
}

impl TransformEngineHandle {
    pub fn new(engine: Arc<dyn TransformEngine>) -> Arc<Self> {
        Arc::new(Self {
            engine,
            init: OnceCell::new(),
        })
    }

    /// Await engine initialization; the first caller pays, concurrent
    /// callers share the same run.
    pub async fn ready(&self) -> Result<()> {
        self.init
            .get_or_try_init(|| async {
                tracing::debug!("Initializing container transform engine");
                self.engine.initialize().await
            })
            .await?;
        Ok(())
    }

    /// Strip container metadata, initializing the engine on first use.
    pub async fn strip(&self, file: &MediaFile) -> Result<MediaFile> {
        self.ready().await?;
        self.engine.strip_container_metadata(file).await
    }
}

/// ffmpeg-backed engine: `-map_metadata -1 -c copy` drops container metadata
/// while copying streams verbatim.
pub struct FfmpegEngine {
    ffmpeg_path: String,
}

impl FfmpegEngine {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

#[async_trait]
impl TransformEngine for FfmpegEngine {
    async fn initialize(&self) -> Result<()> {
        let output = Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .context("Failed to execute ffmpeg")?;

        if !output.success() {
            return Err(anyhow!("ffmpeg -version exited with {}", output));
        }
        Ok(())
    }

    async fn strip_container_metadata(&self, file: &MediaFile) -> Result<MediaFile> {
        let temp_dir = tempfile::TempDir::new().context("Failed to create temp directory")?;

        let extension = match file.extension() {
            ext if ext.is_empty() => "mp4".to_string(),
            ext => ext,
        };
        let input_path = temp_dir.path().join(format!("input.{}", extension));
        let output_path = temp_dir.path().join(format!("output.{}", extension));

        tokio::fs::write(&input_path, &file.data)
            .await
            .context("Failed to write media to temp file")?;

        let output = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .arg("-i")
            .arg(&input_path)
            .args(["-map_metadata", "-1", "-c", "copy"])
            .arg(&output_path)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to execute ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("ffmpeg metadata strip failed: {}", stderr));
        }

        let scrubbed = tokio::fs::read(&output_path)
            .await
            .context("Failed to read scrubbed output")?;

        Ok(MediaFile::new(
            scrubbed.into(),
            file.content_type.clone(),
            file.file_name.clone(),
        ))
    }
}
