//! Multipart upload session

use coldvault_core::{combine, ArchivePlan, PartResult, TreeHash, TreeHasher, VaultTarget};
use tracing::debug;

use crate::service::{ArchiveReceipt, GlacierService};
use crate::{ClientError, Result};

/// An open multipart upload on the service.
///
/// Both ways of ending the session, [`complete`](Self::complete) and
/// [`abort`](Self::abort), consume it, so a session is terminated at most
/// once.
#[derive(Debug)]
pub struct MultipartUpload {
    upload_id: String,
    target: VaultTarget,
    plan: ArchivePlan,
    parts: Vec<PartResult>,
}

impl MultipartUpload {
    /// Start a new upload sized by `plan`
    pub async fn initiate(
        service: &dyn GlacierService,
        target: VaultTarget,
        description: Option<&str>,
        plan: ArchivePlan,
    ) -> Result<Self> {
        let upload_id = service
            .initiate_multipart_upload(&target, description, plan.part_size)
            .await?;

        Ok(MultipartUpload {
            upload_id,
            target,
            plan,
            parts: Vec::with_capacity(plan.part_count as usize),
        })
    }

    /// Record an acknowledged part; parts must arrive in order and without gaps
    pub fn record_part(&mut self, part: PartResult) -> Result<()> {
        let expected_index = self.parts.len() as u64;
        let expected_start = self.parts.last().map(|p| p.range.end + 1).unwrap_or(0);

        if part.index != expected_index || part.range.start != expected_start {
            return Err(ClientError::validation(format!(
                "part {} at {} recorded out of order; expected part {} at offset {}",
                part.index, part.range, expected_index, expected_start
            )));
        }

        self.parts.push(part);
        Ok(())
    }

    /// Root of the tree over all recorded part hashes
    pub fn tree_hash(&self, hasher: &dyn TreeHasher) -> Result<TreeHash> {
        if self.parts.len() as u64 != self.plan.part_count {
            return Err(ClientError::validation(format!(
                "{} of {} parts uploaded",
                self.parts.len(),
                self.plan.part_count
            )));
        }

        let hashes: Vec<TreeHash> = self.parts.iter().map(|p| p.hash).collect();
        Ok(combine(hasher, &hashes)?)
    }

    /// Finish the upload with the archive's total size and tree hash
    pub async fn complete(self, service: &dyn GlacierService, root: &TreeHash) -> Result<ArchiveReceipt> {
        debug!(upload_id = %self.upload_id, checksum = %root, "completing upload");
        service
            .complete_multipart_upload(&self.target, &self.upload_id, self.plan.total_size, root)
            .await
    }

    /// Discard the upload and every part sent so far
    pub async fn abort(self, service: &dyn GlacierService) -> Result<()> {
        debug!(upload_id = %self.upload_id, "aborting upload");
        service.abort_multipart_upload(&self.target, &self.upload_id).await
    }

    /// Get upload ID
    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    pub fn target(&self) -> &VaultTarget {
        &self.target
    }

    pub fn plan(&self) -> &ArchivePlan {
        &self.plan
    }

    /// Parts acknowledged so far, in index order
    pub fn parts(&self) -> &[PartResult] {
        &self.parts
    }

    /// Bytes acknowledged so far
    pub fn bytes_uploaded(&self) -> u64 {
        self.parts.iter().map(|p| p.range.len()).sum()
    }
}
