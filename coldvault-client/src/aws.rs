//! [`GlacierService`] backed by the AWS SDK

use async_trait::async_trait;
use aws_sdk_glacier::config::Region;
use aws_sdk_glacier::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_glacier::primitives::ByteStream;
use aws_sdk_glacier::Client;
use coldvault_core::{AccountId, TreeHash, VaultTarget};
use tracing::debug;

use crate::service::{
    ArchiveReceipt, GlacierService, JobSummary, MultipartUploadSummary, PartUpload, VaultDescription,
};
use crate::{ClientConfig, ClientError, RemoteErrorKind, Result};

/// Amazon S3 Glacier over the official SDK
#[derive(Clone)]
pub struct AwsGlacier {
    client: Client,
}

impl AwsGlacier {
    /// Resolve credentials and region through the SDK's default chains
    pub async fn connect(config: &ClientConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_glacier::config::Builder::from(&sdk_config);
        if let Some(url) = &config.endpoint_url {
            builder = builder.endpoint_url(url);
        }

        AwsGlacier {
            client: Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl GlacierService for AwsGlacier {
    async fn list_vaults(&self, account_id: &AccountId) -> Result<Vec<VaultDescription>> {
        let mut vaults = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let out = self
                .client
                .list_vaults()
                .account_id(account_id.as_str())
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| remote_error("ListVaults", e))?;

            vaults.extend(out.vault_list().iter().map(|v| VaultDescription {
                vault_name: v.vault_name().unwrap_or_default().to_string(),
                creation_date: v.creation_date().map(str::to_string),
                number_of_archives: v.number_of_archives(),
                size_in_bytes: v.size_in_bytes(),
                last_inventory_date: v.last_inventory_date().map(str::to_string),
            }));

            match out.marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(vaults)
    }

    async fn describe_vault(&self, target: &VaultTarget) -> Result<VaultDescription> {
        let out = self
            .client
            .describe_vault()
            .account_id(target.account_id.as_str())
            .vault_name(target.vault_name.as_str())
            .send()
            .await
            .map_err(|e| remote_error("DescribeVault", e))?;

        Ok(VaultDescription {
            vault_name: out
                .vault_name()
                .unwrap_or(target.vault_name.as_str())
                .to_string(),
            creation_date: out.creation_date().map(str::to_string),
            number_of_archives: out.number_of_archives(),
            size_in_bytes: out.size_in_bytes(),
            last_inventory_date: out.last_inventory_date().map(str::to_string),
        })
    }

    async fn list_jobs(&self, target: &VaultTarget) -> Result<Vec<JobSummary>> {
        let mut jobs = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let out = self
                .client
                .list_jobs()
                .account_id(target.account_id.as_str())
                .vault_name(target.vault_name.as_str())
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| remote_error("ListJobs", e))?;

            jobs.extend(out.job_list().iter().map(|job| JobSummary {
                job_id: job.job_id().unwrap_or_default().to_string(),
                action: job.action().map(|a| a.as_str()).unwrap_or("Unknown").to_string(),
                completed: job.completed(),
                status_code: job.status_code().map(|s| s.as_str().to_string()),
                status_message: job.status_message().map(str::to_string),
                creation_date: job.creation_date().map(str::to_string),
            }));

            match out.marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(jobs)
    }

    async fn delete_archive(&self, target: &VaultTarget, archive_id: &str) -> Result<()> {
        self.client
            .delete_archive()
            .account_id(target.account_id.as_str())
            .vault_name(target.vault_name.as_str())
            .archive_id(archive_id)
            .send()
            .await
            .map_err(|e| remote_error("DeleteArchive", e))?;
        Ok(())
    }

    async fn list_multipart_uploads(&self, target: &VaultTarget) -> Result<Vec<MultipartUploadSummary>> {
        let mut uploads = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let out = self
                .client
                .list_multipart_uploads()
                .account_id(target.account_id.as_str())
                .vault_name(target.vault_name.as_str())
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| remote_error("ListMultipartUploads", e))?;

            uploads.extend(out.uploads_list().iter().map(|u| MultipartUploadSummary {
                upload_id: u.multipart_upload_id().unwrap_or_default().to_string(),
                archive_description: u.archive_description().map(str::to_string),
                part_size: u.part_size_in_bytes(),
                creation_date: u.creation_date().map(str::to_string),
            }));

            match out.marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(uploads)
    }

    async fn initiate_multipart_upload(
        &self,
        target: &VaultTarget,
        description: Option<&str>,
        part_size: u64,
    ) -> Result<String> {
        let out = self
            .client
            .initiate_multipart_upload()
            .account_id(target.account_id.as_str())
            .vault_name(target.vault_name.as_str())
            .set_archive_description(description.map(str::to_string))
            .part_size(part_size.to_string())
            .send()
            .await
            .map_err(|e| remote_error("InitiateMultipartUpload", e))?;

        out.upload_id().map(str::to_string).ok_or_else(|| {
            ClientError::remote(
                "InitiateMultipartUpload",
                RemoteErrorKind::Other,
                "response carried no upload id",
            )
        })
    }

    async fn upload_multipart_part(
        &self,
        target: &VaultTarget,
        upload_id: &str,
        part: PartUpload,
    ) -> Result<()> {
        let checksum = part.checksum.to_hex();
        let out = self
            .client
            .upload_multipart_part()
            .account_id(target.account_id.as_str())
            .vault_name(target.vault_name.as_str())
            .upload_id(upload_id)
            .range(part.range.content_range())
            .checksum(&checksum)
            .body(ByteStream::from(part.body))
            .send()
            .await
            .map_err(|e| remote_error("UploadMultipartPart", e))?;

        if let Some(echoed) = out.checksum() {
            if !echoed.eq_ignore_ascii_case(&checksum) {
                return Err(ClientError::remote(
                    "UploadMultipartPart",
                    RemoteErrorKind::ChecksumMismatch,
                    format!("sent {} but service computed {}", checksum, echoed),
                ));
            }
        }
        debug!(upload_id, range = %part.range, "part acknowledged");
        Ok(())
    }

    async fn complete_multipart_upload(
        &self,
        target: &VaultTarget,
        upload_id: &str,
        archive_size: u64,
        checksum: &TreeHash,
    ) -> Result<ArchiveReceipt> {
        let out = self
            .client
            .complete_multipart_upload()
            .account_id(target.account_id.as_str())
            .vault_name(target.vault_name.as_str())
            .upload_id(upload_id)
            .archive_size(archive_size.to_string())
            .checksum(checksum.to_hex())
            .send()
            .await
            .map_err(|e| remote_error("CompleteMultipartUpload", e))?;

        let archive_id = out.archive_id().map(str::to_string).ok_or_else(|| {
            ClientError::remote(
                "CompleteMultipartUpload",
                RemoteErrorKind::Other,
                "response carried no archive id",
            )
        })?;

        Ok(ArchiveReceipt {
            location: out.location().map(str::to_string),
            checksum: out.checksum().map(str::to_string),
            archive_id,
        })
    }

    async fn abort_multipart_upload(&self, target: &VaultTarget, upload_id: &str) -> Result<()> {
        self.client
            .abort_multipart_upload()
            .account_id(target.account_id.as_str())
            .vault_name(target.vault_name.as_str())
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|e| remote_error("AbortMultipartUpload", e))?;
        Ok(())
    }
}

fn remote_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> ClientError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let kind = match &err {
        SdkError::ServiceError(service) => classify(service.err().code(), service.err().message()),
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) | SdkError::ResponseError(_) => {
            RemoteErrorKind::Transport
        }
        _ => RemoteErrorKind::Other,
    };
    ClientError::remote(operation, kind, DisplayErrorContext(&err).to_string())
}

/// Map a service error code and message onto [`RemoteErrorKind`]
fn classify(code: Option<&str>, message: Option<&str>) -> RemoteErrorKind {
    let message = message.unwrap_or_default().to_ascii_lowercase();
    match code.unwrap_or_default() {
        "ResourceNotFoundException" => RemoteErrorKind::NotFound,
        "ThrottlingException" => RemoteErrorKind::Throttled,
        "RequestTimeoutException" | "ServiceUnavailableException" => RemoteErrorKind::Transport,
        "InvalidParameterValueException" if message.contains("checksum") || message.contains("tree hash") => {
            RemoteErrorKind::ChecksumMismatch
        }
        "InvalidParameterValueException" if message.contains("range") => RemoteErrorKind::RangeConflict,
        "InvalidParameterValueException" if message.contains("size") => RemoteErrorKind::SizeMismatch,
        _ => RemoteErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_service_codes() {
        assert_eq!(classify(Some("ResourceNotFoundException"), None), RemoteErrorKind::NotFound);
        assert_eq!(classify(Some("ThrottlingException"), None), RemoteErrorKind::Throttled);
        assert_eq!(
            classify(Some("RequestTimeoutException"), Some("timed out")),
            RemoteErrorKind::Transport
        );
        assert_eq!(classify(None, None), RemoteErrorKind::Other);
    }

    #[test]
    fn test_classify_invalid_parameter_by_message() {
        let code = Some("InvalidParameterValueException");
        assert_eq!(
            classify(code, Some("Checksum mismatch: expected 1 but got 2")),
            RemoteErrorKind::ChecksumMismatch
        );
        assert_eq!(
            classify(code, Some("Content-Range: bytes 0-9/* is incompatible with part size")),
            RemoteErrorKind::RangeConflict
        );
        assert_eq!(
            classify(code, Some("Archive size does not match uploaded parts")),
            RemoteErrorKind::SizeMismatch
        );
        assert_eq!(classify(code, Some("bad vault name")), RemoteErrorKind::Other);
    }
}
