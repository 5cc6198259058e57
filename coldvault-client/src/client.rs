//! Main client implementation

use std::path::Path;
use std::sync::Arc;

use coldvault_core::{VaultName, VaultTarget};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::aws::AwsGlacier;
use crate::orchestrator::{UploadFailure, UploadOrchestrator, UploadReceipt, UploadRequest};
use crate::progress::ProgressObserver;
use crate::service::{GlacierService, JobSummary, MultipartUploadSummary, VaultDescription};
use crate::{ClientConfig, ClientError, Result};

/// Vault operations for one account
pub struct Client {
    service: Arc<dyn GlacierService>,
    config: ClientConfig,
}

impl Client {
    /// Connect to the service described by `config`
    pub async fn connect(config: ClientConfig) -> Self {
        let service = AwsGlacier::connect(&config).await;
        Self::with_service(Arc::new(service), config)
    }

    /// Create new client over any service implementation
    pub fn with_service(service: Arc<dyn GlacierService>, config: ClientConfig) -> Self {
        Client { service, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Address `vault` in the configured account
    pub fn target(&self, vault: &VaultName) -> VaultTarget {
        VaultTarget::new(self.config.account_id.clone(), vault.clone())
    }

    pub async fn list_vaults(&self) -> Result<Vec<VaultDescription>> {
        self.service.list_vaults(&self.config.account_id).await
    }

    pub async fn describe_vault(&self, vault: &VaultName) -> Result<VaultDescription> {
        self.service.describe_vault(&self.target(vault)).await
    }

    pub async fn list_jobs(&self, vault: &VaultName) -> Result<Vec<JobSummary>> {
        self.service.list_jobs(&self.target(vault)).await
    }

    /// Delete one archive
    pub async fn delete_archive(&self, vault: &VaultName, archive_id: &str) -> Result<()> {
        let archive_id = required("archive id", archive_id)?;
        self.service.delete_archive(&self.target(vault), archive_id).await?;
        info!(vault = %vault, archive_id, "Archive deleted");
        Ok(())
    }

    pub async fn list_multipart_uploads(&self, vault: &VaultName) -> Result<Vec<MultipartUploadSummary>> {
        self.service.list_multipart_uploads(&self.target(vault)).await
    }

    /// Abort an upload left open by an earlier run
    pub async fn abort_multipart_upload(&self, vault: &VaultName, upload_id: &str) -> Result<()> {
        let upload_id = required("upload id", upload_id)?;
        self.service
            .abort_multipart_upload(&self.target(vault), upload_id)
            .await?;
        info!(vault = %vault, upload_id, "Upload aborted");
        Ok(())
    }

    /// Orchestrator sharing this client's service and retry policy
    pub fn uploader(&self) -> UploadOrchestrator {
        UploadOrchestrator::new(self.service.clone()).with_retry(self.config.retry)
    }

    /// Upload `path` into `vault` as a single archive
    pub async fn upload_archive(
        &self,
        vault: &VaultName,
        path: &Path,
        description: Option<&str>,
        observer: Arc<dyn ProgressObserver>,
        cancel: &CancellationToken,
    ) -> std::result::Result<UploadReceipt, UploadFailure> {
        let mut request = UploadRequest::new(self.target(vault), path);
        request.description = description.map(str::to_string);

        self.uploader().with_observer(observer).run(&request, cancel).await
    }
}

fn required<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ClientError::validation(format!("{} must not be empty", what)));
    }
    Ok(value)
}
