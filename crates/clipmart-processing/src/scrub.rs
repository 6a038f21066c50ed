//! Metadata scrubber.
//!
//! Strips embedded container metadata before anything leaves the machine.
//! Only formats known to carry sensitive metadata are touched; everything
//! else passes through untouched. Callers decide the failure policy: the
//! preprocessing pipeline falls back to the original file on error so
//! scrubbing never blocks publication.

use std::sync::Arc;

use clipmart_core::models::MediaFile;
use img_parts::{jpeg::Jpeg, png::Png, ImageEXIF};
use thiserror::Error;

use crate::engine::TransformEngineHandle;

#[derive(Debug, Error)]
pub enum ScrubError {
    #[error("Transform engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Container rewrite failed: {0}")]
    TransformFailed(String),
}

/// Format families the scrubber knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormatFamily {
    /// MP4/QuickTime containers, rewritten by the transform engine.
    QuickTime,
    /// JPEG/PNG stills, EXIF-stripped in place.
    Still,
    Other,
}

fn classify(file: &MediaFile) -> FormatFamily {
    let content_type = file.content_type.to_lowercase();
    let extension = file.extension();

    if matches!(content_type.as_str(), "video/mp4" | "video/quicktime")
        || matches!(extension.as_str(), "mp4" | "mov" | "m4v" | "qt")
    {
        FormatFamily::QuickTime
    } else if matches!(content_type.as_str(), "image/jpeg" | "image/png")
        || matches!(extension.as_str(), "jpg" | "jpeg" | "png")
    {
        FormatFamily::Still
    } else {
        FormatFamily::Other
    }
}

pub struct MetadataScrubber {
    engine: Arc<TransformEngineHandle>,
    max_bytes: u64,
}

impl MetadataScrubber {
    pub fn new(engine: Arc<TransformEngineHandle>, max_bytes: u64) -> Self {
        Self { engine, max_bytes }
    }

    /// Scrub embedded metadata from `file`.
    ///
    /// Unknown formats and files above the size ceiling are returned
    /// unchanged without touching the engine.
    pub async fn scrub(&self, file: MediaFile) -> Result<MediaFile, ScrubError> {
        let family = classify(&file);
        if family == FormatFamily::Other {
            return Ok(file);
        }

        if file.len() as u64 > self.max_bytes {
            tracing::debug!(
                file_name = %file.file_name,
                size_bytes = file.len(),
                ceiling_bytes = self.max_bytes,
                "File exceeds scrub ceiling, skipping metadata strip"
            );
            return Ok(file);
        }

        match family {
            FormatFamily::QuickTime => {
                self.engine
                    .ready()
                    .await
                    .map_err(|e| ScrubError::EngineUnavailable(e.to_string()))?;
                let scrubbed = self
                    .engine
                    .strip(&file)
                    .await
                    .map_err(|e| ScrubError::TransformFailed(e.to_string()))?;
                tracing::info!(
                    file_name = %file.file_name,
                    before_bytes = file.len(),
                    after_bytes = scrubbed.len(),
                    "Container metadata stripped"
                );
                Ok(scrubbed)
            }
            FormatFamily::Still => {
                let data = strip_exif(&file.data)
                    .map_err(|e| ScrubError::TransformFailed(e.to_string()))?;
                Ok(MediaFile::new(
                    data.into(),
                    file.content_type,
                    file.file_name,
                ))
            }
            FormatFamily::Other => unreachable!(),
        }
    }
}

/// Remove EXIF segments from a JPEG or PNG still.
///
/// Data that parses as neither is returned unchanged.
fn strip_exif(data: &[u8]) -> Result<Vec<u8>, anyhow::Error> {
    if let Ok(mut jpeg) = Jpeg::from_bytes(data.to_vec().into()) {
        jpeg.set_exif(None);
        return Ok(jpeg.encoder().bytes().to_vec());
    }

    if let Ok(mut png) = Png::from_bytes(data.to_vec().into()) {
        png.set_exif(None);
        return Ok(png.encoder().bytes().to_vec());
    }

    Ok(data.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TransformEngine;
    use anyhow::Result;
    use async_trait::async_trait;
    use bytes::Bytes;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEngine {
        init_calls: AtomicUsize,
        strip_calls: AtomicUsize,
        fail: bool,
    }

    impl CountingEngine {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                init_calls: AtomicUsize::new(0),
                strip_calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl TransformEngine for CountingEngine {
        async fn initialize(&self) -> Result<()> {
            self.init_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn strip_container_metadata(&self, file: &MediaFile) -> Result<MediaFile> {
            self.strip_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(anyhow::anyhow!("rewrite failed"));
            }
            Ok(MediaFile::new(
                Bytes::from_static(b"scrubbed"),
                file.content_type.clone(),
                file.file_name.clone(),
            ))
        }
    }

    fn scrubber(engine: Arc<CountingEngine>, max_bytes: u64) -> MetadataScrubber {
        MetadataScrubber::new(TransformEngineHandle::new(engine), max_bytes)
    }

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[tokio::test]
    async fn test_oversized_mov_bypasses_engine_unchanged() {
        let engine = CountingEngine::new(false);
        let scrubber = scrubber(engine.clone(), 16);

        let data = Bytes::from(vec![0u8; 64]);
        let file = MediaFile::new(data.clone(), "video/quicktime", "big.mov");
        let result = scrubber.scrub(file).await.unwrap();

        assert_eq!(result.data, data);
        assert_eq!(engine.init_calls.load(Ordering::SeqCst), 0);
        assert_eq!(engine.strip_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_format_passes_through_without_engine() {
        let engine = CountingEngine::new(false);
        let scrubber = scrubber(engine.clone(), 1024);

        let data = Bytes::from_static(b"%PDF-1.4");
        let file = MediaFile::new(data.clone(), "application/pdf", "doc.pdf");
        let result = scrubber.scrub(file).await.unwrap();

        assert_eq!(result.data, data);
        assert_eq!(engine.strip_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_quicktime_under_ceiling_is_rewritten() {
        let engine = CountingEngine::new(false);
        let scrubber = scrubber(engine.clone(), 1024);

        let file = MediaFile::new(Bytes::from_static(b"mov-bytes"), "video/mp4", "clip.mp4");
        let result = scrubber.scrub(file).await.unwrap();

        assert_eq!(result.data, Bytes::from_static(b"scrubbed"));
        assert_eq!(engine.init_calls.load(Ordering::SeqCst), 1);
        assert_eq!(engine.strip_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_engine_failure_surfaces_as_error() {
        let engine = CountingEngine::new(true);
        let scrubber = scrubber(engine, 1024);

        let file = MediaFile::new(Bytes::from_static(b"mov-bytes"), "video/mp4", "clip.mp4");
        let err = scrubber.scrub(file).await.unwrap_err();
        assert!(matches!(err, ScrubError::TransformFailed(_)));
    }

    #[tokio::test]
    async fn test_png_still_is_rewritten_in_place() {
        let engine = CountingEngine::new(false);
        let scrubber = scrubber(engine.clone(), u64::MAX);

        let data = png_bytes();
        let file = MediaFile::new(data.clone().into(), "image/png", "thumb.png");
        let result = scrubber.scrub(file).await.unwrap();

        assert!(!result.data.is_empty());
        // Stills never go through the container engine.
        assert_eq!(engine.strip_calls.load(Ordering::SeqCst), 0);
    }
}
