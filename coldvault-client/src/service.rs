//! The cold storage service seam
//!
//! Everything the client needs from the backing service goes through
//! [`GlacierService`], so the upload pipeline can be driven against the
//! real service or an in-memory double.

use async_trait::async_trait;
use bytes::Bytes;
use coldvault_core::{AccountId, ByteRange, TreeHash, VaultTarget};
use serde::Serialize;

use crate::Result;

/// Vault metadata as reported by describe-vault and list-vaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultDescription {
    pub vault_name: String,
    pub creation_date: Option<String>,
    pub number_of_archives: i64,
    pub size_in_bytes: i64,
    pub last_inventory_date: Option<String>,
}

/// One entry of list-jobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub job_id: String,
    pub action: String,
    pub completed: bool,
    pub status_code: Option<String>,
    pub status_message: Option<String>,
    pub creation_date: Option<String>,
}

/// One entry of list-multipart-uploads
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultipartUploadSummary {
    pub upload_id: String,
    pub archive_description: Option<String>,
    pub part_size: i64,
    pub creation_date: Option<String>,
}

/// Body and integrity data for one upload-part request
#[derive(Debug, Clone)]
pub struct PartUpload {
    pub range: ByteRange,
    pub checksum: TreeHash,
    pub body: Bytes,
}

/// What the service reports after completing an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveReceipt {
    pub location: Option<String>,
    pub checksum: Option<String>,
    pub archive_id: String,
}

#[async_trait]
pub trait GlacierService: Send + Sync {
    async fn list_vaults(&self, account_id: &AccountId) -> Result<Vec<VaultDescription>>;

    async fn describe_vault(&self, target: &VaultTarget) -> Result<VaultDescription>;

    async fn list_jobs(&self, target: &VaultTarget) -> Result<Vec<JobSummary>>;

    async fn delete_archive(&self, target: &VaultTarget, archive_id: &str) -> Result<()>;

    async fn list_multipart_uploads(&self, target: &VaultTarget) -> Result<Vec<MultipartUploadSummary>>;

    /// Open a multipart upload session and return its upload id
    async fn initiate_multipart_upload(
        &self,
        target: &VaultTarget,
        description: Option<&str>,
        part_size: u64,
    ) -> Result<String>;

    async fn upload_multipart_part(
        &self,
        target: &VaultTarget,
        upload_id: &str,
        part: PartUpload,
    ) -> Result<()>;

    async fn complete_multipart_upload(
        &self,
        target: &VaultTarget,
        upload_id: &str,
        archive_size: u64,
        checksum: &TreeHash,
    ) -> Result<ArchiveReceipt>;

    async fn abort_multipart_upload(&self, target: &VaultTarget, upload_id: &str) -> Result<()>;
}
