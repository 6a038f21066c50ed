//! Concurrent transfer execution.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use clipmart_core::config::{DestinationClass, DestinationSecrets};
use clipmart_core::models::StorageKey;
use clipmart_core::AppError;
use clipmart_storage::{TransferAuthorizer, TransferGrant};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use super::task::{
    CompletedTransfer, FailedTask, ProgressEvent, TransferTask, UploadError, UploadOutcome,
};

const TRANSFER_TIMEOUT_SECS: u64 = 10 * 60;
const PROGRESS_CHUNK_BYTES: usize = 256 * 1024;

/// Client-side view of transfer authorization: the shared secret is already
/// bound, so the orchestrator only names the destination and key.
#[async_trait]
pub trait GrantProvider: Send + Sync {
    async fn grant(
        &self,
        destination: DestinationClass,
        key: &StorageKey,
        content_type: &str,
    ) -> Result<TransferGrant, AppError>;
}

/// Grant provider backed by the in-process [`TransferAuthorizer`].
pub struct AuthorizedGrantProvider {
    authorizer: Arc<TransferAuthorizer>,
    secrets: DestinationSecrets,
}

impl AuthorizedGrantProvider {
    pub fn new(authorizer: Arc<TransferAuthorizer>, secrets: DestinationSecrets) -> Self {
        Self {
            authorizer,
            secrets,
        }
    }
}

#[async_trait]
impl GrantProvider for AuthorizedGrantProvider {
    async fn grant(
        &self,
        destination: DestinationClass,
        key: &StorageKey,
        content_type: &str,
    ) -> Result<TransferGrant, AppError> {
        let secret = match destination {
            DestinationClass::GeneralAsset => self.secrets.general.as_deref(),
            DestinationClass::RestrictedVault => self.secrets.vault.as_deref(),
        }
        .unwrap_or_default();

        self.authorizer
            .authorize(destination, key, content_type, secret)
            .await
    }
}

/// Drives a set of named transfer tasks concurrently.
///
/// Completion policy is all-or-nothing: the orchestrator waits for every
/// submitted task, and any failure (required or optional) fails the whole
/// attempt. No automatic retry; callers resubmit the operation.
pub struct UploadOrchestrator {
    grants: Arc<dyn GrantProvider>,
    client: reqwest::Client,
}

impl UploadOrchestrator {
    pub fn new(grants: Arc<dyn GrantProvider>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TRANSFER_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client for transfers")?;

        Ok(Self { grants, client })
    }

    /// Run all tasks to completion.
    ///
    /// Every task settles before the result is reported, so a failure never
    /// leaves siblings mid-flight. The cancellation token aborts in-flight
    /// transfers when the invoking context is abandoned.
    #[tracing::instrument(skip_all, fields(task_count = tasks.len()))]
    pub async fn run(
        &self,
        tasks: Vec<TransferTask>,
        cancel: CancellationToken,
        progress: Option<UnboundedSender<ProgressEvent>>,
    ) -> Result<UploadOutcome, UploadError> {
        let mut handles = Vec::with_capacity(tasks.len());

        for task in tasks {
            let grants = self.grants.clone();
            let client = self.client.clone();
            let cancel = cancel.clone();
            let progress = progress.clone();
            let name = task.name.clone();

            let handle = tokio::spawn(async move {
                execute_transfer(grants, client, task, cancel, progress).await
            });
            handles.push((name, handle));
        }

        let mut outcome = UploadOutcome::default();
        let mut failed = Vec::new();

        for (name, handle) in handles {
            match handle.await {
                Ok(Ok(completed)) => {
                    outcome.completed.insert(name, completed);
                }
                Ok(Err(error)) => {
                    tracing::warn!(task = %name, error = %error, "Transfer task failed");
                    failed.push(FailedTask { name, error });
                }
                Err(join_error) => {
                    failed.push(FailedTask {
                        name,
                        error: AppError::Internal(format!("Task panicked: {}", join_error)),
                    });
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        if !failed.is_empty() {
            return Err(UploadError::TasksFailed { failed });
        }

        tracing::info!(
            completed = outcome.completed.len(),
            "All transfer tasks completed"
        );
        Ok(outcome)
    }
}

async fn execute_transfer(
    grants: Arc<dyn GrantProvider>,
    client: reqwest::Client,
    task: TransferTask,
    cancel: CancellationToken,
    progress: Option<UnboundedSender<ProgressEvent>>,
) -> Result<CompletedTransfer, AppError> {
    if cancel.is_cancelled() {
        return Err(AppError::Upstream("Transfer cancelled".to_string()));
    }

    let grant = grants
        .grant(task.destination, &task.key, &task.content_type)
        .await?;

    report_progress(&progress, &task.name, 0.0);

    let total_bytes = task.data.len();
    let body = progress_body(task.data.clone(), task.name.clone(), progress.clone());

    let mut request = client
        .put(&grant.transfer_url)
        .header(reqwest::header::CONTENT_LENGTH, total_bytes);
    let grant_sets_content_type = grant
        .required_headers
        .keys()
        .any(|name| name.eq_ignore_ascii_case("content-type"));
    if !grant_sets_content_type {
        request = request.header(reqwest::header::CONTENT_TYPE, task.content_type.as_str());
    }
    for (name, value) in &grant.required_headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = tokio::select! {
        _ = cancel.cancelled() => {
            return Err(AppError::Upstream("Transfer cancelled".to_string()));
        }
        result = request.body(body).send() => result.map_err(|e| {
            AppError::Upstream(format!("Transfer to {} failed: {}", task.destination, e))
        })?,
    };

    if !response.status().is_success() {
        return Err(AppError::Upstream(format!(
            "Transfer to {} returned {}",
            task.destination,
            response.status()
        )));
    }

    report_progress(&progress, &task.name, 100.0);

    tracing::info!(
        task = %task.name,
        destination = %task.destination,
        key = %task.key,
        size_bytes = total_bytes,
        "Transfer completed"
    );

    Ok(CompletedTransfer {
        key: task.key,
        public_url: grant.public_url,
    })
}

/// Stream the payload in chunks, reporting cumulative progress per chunk.
fn progress_body(
    data: Bytes,
    task_name: String,
    progress: Option<UnboundedSender<ProgressEvent>>,
) -> reqwest::Body {
    let total = data.len().max(1) as f64;
    let mut chunks = Vec::new();
    let mut offset = 0;
    while offset < data.len() {
        let end = (offset + PROGRESS_CHUNK_BYTES).min(data.len());
        chunks.push((data.slice(offset..end), end));
        offset = end;
    }

    let stream = futures::stream::iter(chunks.into_iter().map(move |(chunk, sent)| {
        if let Some(ref sender) = progress {
            let _ = sender.send(ProgressEvent {
                task: task_name.clone(),
                percent: sent as f64 * 100.0 / total,
            });
        }
        Ok::<Bytes, std::io::Error>(chunk)
    }));

    reqwest::Body::wrap_stream(stream)
}

fn report_progress(
    progress: &Option<UnboundedSender<ProgressEvent>>,
    task_name: &str,
    percent: f64,
) {
    if let Some(sender) = progress {
        let _ = sender.send(ProgressEvent {
            task: task_name.to_string(),
            percent,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::task::{TASK_FULL, TASK_PREVIEW, TASK_THUMBNAIL};
    use chrono::Utc;
    use std::collections::HashMap;
    use tokio::sync::mpsc;

    /// Grants transfers straight to a base URL, `{base}/{key}`.
    struct DirectGrantProvider {
        base_url: String,
        deny: Option<String>,
    }

    #[async_trait]
    impl GrantProvider for DirectGrantProvider {
        async fn grant(
            &self,
            _destination: DestinationClass,
            key: &StorageKey,
            _content_type: &str,
        ) -> Result<TransferGrant, AppError> {
            if self.deny.as_deref() == Some(key.as_str()) {
                return Err(AppError::Unauthorized("denied".to_string()));
            }
            Ok(TransferGrant {
                transfer_url: format!("{}/{}", self.base_url, key),
                required_headers: HashMap::new(),
                public_url: format!("https://cdn.example/{}", key),
                expires_at: Utc::now() + chrono::Duration::minutes(15),
            })
        }
    }

    fn orchestrator(base_url: &str, deny: Option<&str>) -> UploadOrchestrator {
        UploadOrchestrator::new(Arc::new(DirectGrantProvider {
            base_url: base_url.to_string(),
            deny: deny.map(String::from),
        }))
        .unwrap()
    }

    fn task(name: &str, key: &str, destination: DestinationClass) -> TransferTask {
        TransferTask::required(
            name,
            Bytes::from(vec![7u8; 1024]),
            destination,
            StorageKey::new(key),
            "application/octet-stream",
        )
    }

    fn standard_tasks() -> Vec<TransferTask> {
        vec![
            task(TASK_THUMBNAIL, "thumb.jpg", DestinationClass::GeneralAsset),
            task(TASK_PREVIEW, "preview.mp4", DestinationClass::GeneralAsset),
            TransferTask::optional(
                TASK_FULL,
                Bytes::from(vec![7u8; 2048]),
                DestinationClass::RestrictedVault,
                StorageKey::new("full.mp4"),
                "video/mp4",
            ),
        ]
    }

    #[tokio::test]
    async fn test_all_tasks_complete_concurrently() {
        let mut server = mockito::Server::new_async().await;
        let thumb = server.mock("PUT", "/thumb.jpg").with_status(200).create_async().await;
        let preview = server.mock("PUT", "/preview.mp4").with_status(201).create_async().await;
        let full = server.mock("PUT", "/full.mp4").with_status(200).create_async().await;

        let outcome = orchestrator(&server.url(), None)
            .run(standard_tasks(), CancellationToken::new(), None)
            .await
            .unwrap();

        thumb.assert_async().await;
        preview.assert_async().await;
        full.assert_async().await;

        assert_eq!(outcome.completed.len(), 3);
        assert_eq!(
            outcome.public_url(TASK_PREVIEW),
            Some("https://cdn.example/preview.mp4")
        );
        assert_eq!(
            outcome.key(TASK_FULL).map(|k| k.as_str()),
            Some("full.mp4")
        );
    }

    #[tokio::test]
    async fn test_optional_task_failure_fails_whole_attempt() {
        let mut server = mockito::Server::new_async().await;
        let thumb = server.mock("PUT", "/thumb.jpg").with_status(200).create_async().await;
        let preview = server.mock("PUT", "/preview.mp4").with_status(200).create_async().await;
        let full = server.mock("PUT", "/full.mp4").with_status(503).create_async().await;

        let err = orchestrator(&server.url(), None)
            .run(standard_tasks(), CancellationToken::new(), None)
            .await
            .unwrap_err();

        // Every task still ran to settlement before the failure was reported.
        thumb.assert_async().await;
        preview.assert_async().await;
        full.assert_async().await;

        assert_eq!(err.failed_task_names(), vec![TASK_FULL]);
        match err {
            UploadError::TasksFailed { failed } => {
                assert!(matches!(failed[0].error, AppError::Upstream(_)));
            }
            other => panic!("Expected TasksFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_denied_grant_names_the_task() {
        let mut server = mockito::Server::new_async().await;
        server.mock("PUT", "/thumb.jpg").with_status(200).create_async().await;
        server.mock("PUT", "/preview.mp4").with_status(200).create_async().await;

        let err = orchestrator(&server.url(), Some("full.mp4"))
            .run(standard_tasks(), CancellationToken::new(), None)
            .await
            .unwrap_err();

        assert_eq!(err.failed_task_names(), vec![TASK_FULL]);
    }

    #[tokio::test]
    async fn test_cancellation_aborts_the_attempt() {
        let server = mockito::Server::new_async().await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = orchestrator(&server.url(), None)
            .run(standard_tasks(), cancel, None)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Cancelled));
    }

    #[tokio::test]
    async fn test_progress_reaches_one_hundred() {
        let mut server = mockito::Server::new_async().await;
        server.mock("PUT", "/thumb.jpg").with_status(200).create_async().await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let tasks = vec![task(
            TASK_THUMBNAIL,
            "thumb.jpg",
            DestinationClass::GeneralAsset,
        )];

        orchestrator(&server.url(), None)
            .run(tasks, CancellationToken::new(), Some(tx))
            .await
            .unwrap();

        let mut last = -1.0;
        while let Ok(event) = rx.try_recv() {
            assert_eq!(event.task, TASK_THUMBNAIL);
            assert!(event.percent >= last);
            assert!((0.0..=100.0).contains(&event.percent));
            last = event.percent;
        }
        assert_eq!(last, 100.0);
    }

    #[tokio::test]
    async fn test_empty_task_list_yields_empty_outcome() {
        let server = mockito::Server::new_async().await;
        let outcome = orchestrator(&server.url(), None)
            .run(Vec::new(), CancellationToken::new(), None)
            .await
            .unwrap();
        assert!(outcome.completed.is_empty());
    }

    struct StubBackend;

    #[async_trait]
    impl clipmart_storage::DestinationBackend for StubBackend {
        async fn grant_put(
            &self,
            key: &StorageKey,
            _content_type: &str,
        ) -> clipmart_storage::StorageResult<TransferGrant> {
            Ok(TransferGrant {
                transfer_url: format!("https://backend.example/put/{}", key),
                required_headers: HashMap::new(),
                public_url: format!("https://cdn.example/{}", key),
                expires_at: Utc::now() + chrono::Duration::minutes(15),
            })
        }

        async fn exists(&self, _key: &StorageKey) -> clipmart_storage::StorageResult<bool> {
            Ok(false)
        }

        fn public_url(&self, key: &StorageKey) -> String {
            format!("https://cdn.example/{}", key)
        }
    }

    #[tokio::test]
    async fn test_authorized_provider_binds_class_secrets() {
        let backend: Arc<dyn clipmart_storage::DestinationBackend> = Arc::new(StubBackend);
        let authorizer = Arc::new(
            TransferAuthorizer::new().with_general("asset-secret", Some(backend)),
        );

        let provider = AuthorizedGrantProvider::new(
            authorizer.clone(),
            DestinationSecrets {
                general: Some("asset-secret".to_string()),
                vault: None,
            },
        );
        let key = StorageKey::new("alice/clip-1.mp4");
        let grant = provider
            .grant(DestinationClass::GeneralAsset, &key, "video/mp4")
            .await
            .unwrap();
        assert_eq!(grant.public_url, "https://cdn.example/alice/clip-1.mp4");

        // No vault secret bound: the authorizer rejects the class outright.
        let err = provider
            .grant(DestinationClass::RestrictedVault, &key, "video/mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Misconfigured(_)));

        let wrong = AuthorizedGrantProvider::new(
            authorizer,
            DestinationSecrets {
                general: Some("other".to_string()),
                vault: None,
            },
        );
        let err = wrong
            .grant(DestinationClass::GeneralAsset, &key, "video/mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
