//! End-to-end archive upload
//!
//! Drives one upload through its stages:
//!
//! ```text
//! Idle -> VaultVerified -> ArchiveDescribed -> UploadInitiated -> PartsUploading -> Completing -> Completed
//!                                                                        |
//!                                                                        +-> Aborting -> Aborted
//! ```
//!
//! A failure before initiation leaves nothing on the service. Once an upload
//! id exists, a failed or cancelled part phase triggers exactly one abort.
//! A failed complete is reported as is; the service may or may not have
//! assembled the archive, so the upload id is returned instead of aborting.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use coldvault_core::{ArchivePlan, Sha256Hasher, TreeHash, TreeHasher, VaultTarget};
use serde::Serialize;
use thiserror::Error;
use tokio::fs::File;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::multipart::MultipartUpload;
use crate::progress::{NoProgress, ProgressObserver};
use crate::service::GlacierService;
use crate::streaming::PartReader;
use crate::uploader::PartUploader;
use crate::{ClientError, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadStage {
    Idle,
    VaultVerified,
    ArchiveDescribed,
    UploadInitiated,
    PartsUploading,
    Completing,
    Completed,
    Aborting,
    Aborted,
}

impl std::fmt::Display for UploadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UploadStage::Idle => "idle",
            UploadStage::VaultVerified => "vault verified",
            UploadStage::ArchiveDescribed => "archive described",
            UploadStage::UploadInitiated => "upload initiated",
            UploadStage::PartsUploading => "parts uploading",
            UploadStage::Completing => "completing",
            UploadStage::Completed => "completed",
            UploadStage::Aborting => "aborting",
            UploadStage::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// Result of the cleanup abort after a failed part phase
#[derive(Debug)]
pub enum AbortOutcome {
    Aborted,
    /// The upload is still open on the service and must be aborted by hand
    Failed(ClientError),
}

/// Why an upload did not finish, and what was left behind
#[derive(Debug, Error)]
#[error("upload failed while {stage}")]
pub struct UploadFailure {
    /// Stage in which the failure happened
    pub stage: UploadStage,
    #[source]
    pub error: ClientError,
    /// Set once the service issued an upload id
    pub upload_id: Option<String>,
    /// Set when an abort was attempted
    pub abort: Option<AbortOutcome>,
}

impl UploadFailure {
    fn before_upload(stage: UploadStage, error: ClientError) -> Self {
        UploadFailure {
            stage,
            error,
            upload_id: None,
            abort: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.error, ClientError::Cancelled)
    }

    /// Whether an upload may still be open on the service
    pub fn left_open_upload(&self) -> bool {
        self.upload_id.is_some() && !matches!(self.abort, Some(AbortOutcome::Aborted))
    }
}

/// What to upload and where
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub target: VaultTarget,
    pub path: PathBuf,
    pub description: Option<String>,
}

impl UploadRequest {
    /// Create new upload request
    pub fn new(target: VaultTarget, path: impl Into<PathBuf>) -> Self {
        Self {
            target,
            path: path.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A completed upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub archive_id: String,
    pub location: Option<String>,
    /// Tree hash computed locally and sent with complete
    pub checksum: TreeHash,
    /// Tree hash reported back by the service, if any
    pub service_checksum: Option<String>,
    pub archive_size: u64,
    pub part_size: u64,
    pub part_count: u64,
    pub upload_id: String,
}

/// Runs uploads against a [`GlacierService`]
pub struct UploadOrchestrator {
    service: Arc<dyn GlacierService>,
    hasher: Arc<dyn TreeHasher>,
    observer: Arc<dyn ProgressObserver>,
    retry: RetryPolicy,
}

impl UploadOrchestrator {
    /// Create new orchestrator with SHA-256 hashing, no progress output and
    /// the default retry policy
    pub fn new(service: Arc<dyn GlacierService>) -> Self {
        Self {
            service,
            hasher: Arc::new(Sha256Hasher),
            observer: Arc::new(NoProgress),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn TreeHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Upload `request.path` as one archive.
    ///
    /// `cancel` is observed before initiation, between parts and before
    /// complete. It is not observed once the upload has reached a terminal
    /// stage.
    pub async fn run(
        &self,
        request: &UploadRequest,
        cancel: &CancellationToken,
    ) -> std::result::Result<UploadReceipt, UploadFailure> {
        let mut stage = UploadStage::Idle;
        if cancel.is_cancelled() {
            return Err(UploadFailure::before_upload(stage, ClientError::Cancelled));
        }

        let vault = self
            .service
            .describe_vault(&request.target)
            .await
            .map_err(|e| UploadFailure::before_upload(stage, e))?;
        info!(
            vault = %request.target,
            archives = vault.number_of_archives,
            size_in_bytes = vault.size_in_bytes,
            "Vault verified"
        );
        stage = transition(stage, UploadStage::VaultVerified);

        let (plan, mut reader) = describe_archive(&request.path)
            .await
            .map_err(|e| UploadFailure::before_upload(stage, e))?;
        stage = transition(stage, UploadStage::ArchiveDescribed);

        if cancel.is_cancelled() {
            info!("Cancelled before the upload was initiated");
            return Err(UploadFailure::before_upload(stage, ClientError::Cancelled));
        }

        let mut session = MultipartUpload::initiate(
            self.service.as_ref(),
            request.target.clone(),
            request.description.as_deref(),
            plan,
        )
        .await
        .map_err(|e| UploadFailure::before_upload(stage, e))?;
        info!(upload_id = session.upload_id(), "Upload initiated");
        stage = transition(stage, UploadStage::UploadInitiated);

        stage = transition(stage, UploadStage::PartsUploading);
        let uploader = PartUploader::new(
            self.service.as_ref(),
            self.hasher.as_ref(),
            self.observer.as_ref(),
            self.retry,
            cancel,
        );
        let parts = uploader.upload_all(&mut session, &mut reader).await;
        drop(reader);

        let root = parts
            .and_then(|()| {
                if cancel.is_cancelled() {
                    Err(ClientError::Cancelled)
                } else {
                    Ok(())
                }
            })
            .and_then(|()| session.tree_hash(self.hasher.as_ref()));

        let root = match root {
            Ok(root) => root,
            Err(error) => return Err(self.abort(session, stage, error).await),
        };

        let upload_id = session.upload_id().to_string();
        stage = transition(stage, UploadStage::Completing);
        match session.complete(self.service.as_ref(), &root).await {
            Ok(archive) => {
                transition(stage, UploadStage::Completed);
                if let Some(reported) = &archive.checksum {
                    if !reported.eq_ignore_ascii_case(&root.to_hex()) {
                        warn!(
                            local = %root,
                            service = %reported,
                            "Service reported a different archive checksum"
                        );
                    }
                }
                info!(
                    archive_id = %archive.archive_id,
                    checksum = %root,
                    "Upload complete"
                );

                Ok(UploadReceipt {
                    archive_id: archive.archive_id,
                    location: archive.location,
                    checksum: root,
                    service_checksum: archive.checksum,
                    archive_size: plan.total_size,
                    part_size: plan.part_size,
                    part_count: plan.part_count,
                    upload_id,
                })
            }
            Err(error) => {
                error!(upload_id = %upload_id, error = %error, "Complete failed; upload left as is");
                Err(UploadFailure {
                    stage,
                    error,
                    upload_id: Some(upload_id),
                    abort: None,
                })
            }
        }
    }

    async fn abort(&self, session: MultipartUpload, stage: UploadStage, error: ClientError) -> UploadFailure {
        let upload_id = session.upload_id().to_string();
        match &error {
            ClientError::Cancelled => warn!(upload_id = %upload_id, "Cancellation requested, aborting upload"),
            other => error!(upload_id = %upload_id, error = %other, "Upload failed, aborting"),
        }
        let aborting = transition(stage, UploadStage::Aborting);

        let abort = match session.abort(self.service.as_ref()).await {
            Ok(()) => {
                transition(aborting, UploadStage::Aborted);
                info!(upload_id = %upload_id, "Upload aborted");
                AbortOutcome::Aborted
            }
            Err(e) => {
                error!(
                    upload_id = %upload_id,
                    error = %e,
                    "Abort failed; the upload must be aborted manually"
                );
                AbortOutcome::Failed(e)
            }
        };

        UploadFailure {
            stage,
            error,
            upload_id: Some(upload_id),
            abort: Some(abort),
        }
    }
}

fn transition(from: UploadStage, to: UploadStage) -> UploadStage {
    debug!(%from, %to, "upload stage");
    to
}

/// Size the archive and open it for reading
async fn describe_archive(path: &Path) -> crate::Result<(ArchivePlan, PartReader<File>)> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| ClientError::validation(format!("cannot read {}: {}", path.display(), e)))?;
    if !metadata.is_file() {
        return Err(ClientError::validation(format!(
            "{} is not a regular file",
            path.display()
        )));
    }

    let plan = ArchivePlan::for_size(metadata.len());
    if plan.is_empty() {
        return Err(ClientError::validation(format!(
            "{} is empty; zero-byte archives are not uploaded",
            path.display()
        )));
    }
    if !plan.within_service_limits() {
        return Err(ClientError::validation(format!(
            "{} is too large: {} bytes needs {} byte parts",
            path.display(),
            plan.total_size,
            plan.part_size
        )));
    }

    info!(
        path = %path.display(),
        size = plan.total_size,
        part_size = plan.part_size,
        parts = plan.part_count,
        "Archive described"
    );

    let reader = PartReader::open(path, plan.part_size).await?;
    Ok((plan, reader))
}
