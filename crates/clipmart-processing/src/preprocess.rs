//! Preprocessing pipeline: scrub → probe duration → thumbnail candidate.
//!
//! Runs sequentially: thumbnail extraction reads the scrubbed file, so each
//! step completes (or fails open) before the next begins. Scrub failures
//! fall back to the original bytes; probe failures surface unless an
//! operator-supplied thumbnail removes the need to extract one.

use std::sync::Arc;

use bytes::Bytes;
use clipmart_core::models::MediaFile;
use clipmart_core::{AppError, Config};

use crate::engine::{FfmpegEngine, TransformEngineHandle};
use crate::probe::{FfmpegProber, MediaProber};
use crate::scrub::MetadataScrubber;

/// Output of the preprocessing stage, ready for upload orchestration.
#[derive(Debug, Clone)]
pub struct PreparedMedia {
    pub file: MediaFile,
    /// Rounded to the nearest whole second.
    pub duration_secs: i64,
    pub thumbnail: Bytes,
    /// True when the operator supplied the thumbnail verbatim.
    pub custom_thumbnail: bool,
}

pub struct Preprocessor {
    scrubber: MetadataScrubber,
    prober: Arc<dyn MediaProber>,
}

impl Preprocessor {
    pub fn new(scrubber: MetadataScrubber, prober: Arc<dyn MediaProber>) -> Self {
        Self { scrubber, prober }
    }

    /// Production wiring: ffmpeg-backed engine and prober from configuration.
    pub fn from_config(config: &Config) -> Self {
        let engine =
            TransformEngineHandle::new(Arc::new(FfmpegEngine::new(config.ffmpeg_path.clone())));
        let scrubber = MetadataScrubber::new(engine, config.scrub_max_bytes);
        let prober = Arc::new(FfmpegProber::new(
            config.ffmpeg_path.clone(),
            config.ffprobe_path.clone(),
        ));
        Self::new(scrubber, prober)
    }

    #[tracing::instrument(skip(self, file, operator_thumbnail), fields(file_name = %file.file_name))]
    pub async fn prepare(
        &self,
        file: MediaFile,
        operator_thumbnail: Option<Bytes>,
    ) -> Result<PreparedMedia, AppError> {
        // Fail open: a scrub failure must never block publication, so the
        // original bytes continue down the pipeline.
        let file = match self.scrubber.scrub(file.clone()).await {
            Ok(scrubbed) => scrubbed,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    file_name = %file.file_name,
                    "Metadata scrub failed, continuing with original file"
                );
                file
            }
        };

        let raw_duration = self
            .prober
            .probe_duration_secs(&file)
            .await
            .map_err(|e| AppError::Computation(e.to_string()))?;
        let duration_secs = raw_duration.round() as i64;

        let (thumbnail, custom_thumbnail) = match operator_thumbnail {
            Some(thumbnail) => (thumbnail, true),
            None => {
                let extracted = self
                    .prober
                    .extract_thumbnail(&file, raw_duration)
                    .await
                    .map_err(|e| AppError::Computation(e.to_string()))?;
                (extracted, false)
            }
        };

        tracing::info!(
            file_name = %file.file_name,
            duration_secs,
            custom_thumbnail,
            "Preprocessing complete"
        );

        Ok(PreparedMedia {
            file,
            duration_secs,
            thumbnail,
            custom_thumbnail,
        })
    }
}
