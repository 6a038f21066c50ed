//! End-to-end publish pipeline: preprocess → upload → persist.
//!
//! Failures carry the stage they happened in so operators can tell
//! "network failed, retry" from "validation failed, fix input". Nothing is
//! persisted unless the orchestrator reports full success.

use bytes::Bytes;
use clipmart_core::config::DestinationClass;
use clipmart_core::models::{ItemDraft, MediaFile};
use clipmart_core::AppError;
use clipmart_processing::upload::{
    TransferTask, UploadOrchestrator, TASK_FULL, TASK_PREVIEW, TASK_THUMBNAIL,
};
use clipmart_processing::{PreparedMedia, Preprocessor, ProgressEvent};
use clipmart_storage::keys::generate_storage_key;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::publisher::PublishService;

/// Which stage of the publish attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
    Preprocess,
    Upload,
    Persist,
}

impl std::fmt::Display for PublishStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PublishStage::Preprocess => "preprocessing",
            PublishStage::Upload => "upload",
            PublishStage::Persist => "persistence",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("Publish failed during {stage}: {source}")]
pub struct PublishPipelineError {
    pub stage: PublishStage,
    #[source]
    pub source: AppError,
}

impl PublishPipelineError {
    fn at(stage: PublishStage) -> impl FnOnce(AppError) -> Self {
        move |source| Self { stage, source }
    }
}

/// One publish attempt.
pub struct PublishRequest {
    pub draft: ItemDraft,
    pub media: MediaFile,
    /// Operator-supplied thumbnail, used verbatim when present.
    pub operator_thumbnail: Option<Bytes>,
    /// Submit the full-resolution transfer to the restricted vault.
    pub offer_full_resolution: bool,
}

pub struct PublishPipeline {
    preprocessor: Preprocessor,
    orchestrator: UploadOrchestrator,
    publisher: PublishService,
}

impl PublishPipeline {
    pub fn new(
        preprocessor: Preprocessor,
        orchestrator: UploadOrchestrator,
        publisher: PublishService,
    ) -> Self {
        Self {
            preprocessor,
            orchestrator,
            publisher,
        }
    }

    /// Run one publish attempt end to end.
    #[tracing::instrument(skip_all, fields(title = %request.draft.title, creator = %request.draft.creator_name))]
    pub async fn run(
        &self,
        request: PublishRequest,
        cancel: CancellationToken,
        progress: Option<UnboundedSender<ProgressEvent>>,
    ) -> Result<clipmart_core::models::PublishedItem, PublishPipelineError> {
        let PublishRequest {
            mut draft,
            media,
            operator_thumbnail,
            offer_full_resolution,
        } = request;

        let prepared = self
            .preprocessor
            .prepare(media, operator_thumbnail)
            .await
            .map_err(PublishPipelineError::at(PublishStage::Preprocess))?;

        let tasks = build_tasks(&draft, &prepared, offer_full_resolution);
        let outcome = self
            .orchestrator
            .run(tasks, cancel, progress)
            .await
            .map_err(|e| PublishPipelineError {
                stage: PublishStage::Upload,
                source: e.into(),
            })?;

        draft.preview_url = outcome.public_url(TASK_PREVIEW).map(String::from);
        draft.thumbnail_url = outcome.public_url(TASK_THUMBNAIL).map(String::from);
        draft.full_key = outcome.key(TASK_FULL).map(|key| key.as_str().to_string());
        draft.duration_secs = Some(prepared.duration_secs);

        self.publisher
            .publish(draft)
            .await
            .map_err(PublishPipelineError::at(PublishStage::Persist))
    }
}

fn build_tasks(
    draft: &ItemDraft,
    prepared: &PreparedMedia,
    offer_full_resolution: bool,
) -> Vec<TransferTask> {
    let extension = match prepared.file.extension() {
        ext if ext.is_empty() => "mp4".to_string(),
        ext => ext,
    };

    let preview_key = generate_storage_key(&draft.creator_name, &draft.title, &extension);
    let thumbnail_key = generate_storage_key(&draft.creator_name, &draft.title, "jpg");

    let mut tasks = vec![
        TransferTask::required(
            TASK_PREVIEW,
            prepared.file.data.clone(),
            DestinationClass::GeneralAsset,
            preview_key,
            prepared.file.content_type.clone(),
        ),
        // A custom thumbnail's transfer is tolerated absent from the result;
        // an extracted one gates publication.
        if prepared.custom_thumbnail {
            TransferTask::optional(
                TASK_THUMBNAIL,
                prepared.thumbnail.clone(),
                DestinationClass::GeneralAsset,
                thumbnail_key,
                "image/jpeg",
            )
        } else {
            TransferTask::required(
                TASK_THUMBNAIL,
                prepared.thumbnail.clone(),
                DestinationClass::GeneralAsset,
                thumbnail_key,
                "image/jpeg",
            )
        },
    ];

    if offer_full_resolution {
        let full_key = generate_storage_key(&draft.creator_name, &draft.title, &extension);
        tasks.push(TransferTask::optional(
            TASK_FULL,
            prepared.file.data.clone(),
            DestinationClass::RestrictedVault,
            full_key,
            prepared.file.content_type.clone(),
        ));
    }

    tasks
}
