//! Sequential part uploads

use coldvault_core::{hash_part, ByteRange, PartResult, TreeHasher};
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::multipart::MultipartUpload;
use crate::progress::{PartProgress, ProgressObserver};
use crate::service::{GlacierService, PartUpload};
use crate::streaming::PartReader;
use crate::{ClientError, Result, RetryPolicy};

/// Streams an archive into an open session one part at a time.
///
/// The next part is read only after the previous one was acknowledged, and
/// cancellation is honoured between parts, never while a request is out.
pub struct PartUploader<'a> {
    service: &'a dyn GlacierService,
    hasher: &'a dyn TreeHasher,
    observer: &'a dyn ProgressObserver,
    retry: RetryPolicy,
    cancel: &'a CancellationToken,
}

impl<'a> PartUploader<'a> {
    pub fn new(
        service: &'a dyn GlacierService,
        hasher: &'a dyn TreeHasher,
        observer: &'a dyn ProgressObserver,
        retry: RetryPolicy,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            service,
            hasher,
            observer,
            retry,
            cancel,
        }
    }

    /// Upload every part of the archive, recording each in `session`.
    ///
    /// Stops at the first failed part; nothing after it is read or sent.
    pub async fn upload_all<R>(&self, session: &mut MultipartUpload, reader: &mut PartReader<R>) -> Result<()>
    where
        R: AsyncRead + Unpin + Send,
    {
        let plan = *session.plan();

        // bytes appended past the planned size are not part of this archive
        while (session.parts().len() as u64) < plan.part_count {
            self.check_cancelled()?;

            let Some(chunk) = reader.next_part().await? else {
                break;
            };

            let range = ByteRange::new(chunk.offset, chunk.body.len() as u64);
            if plan.range_for(chunk.index) != Some(range) {
                return Err(ClientError::validation(format!(
                    "archive changed while uploading: read {} for part {} of {}",
                    range,
                    chunk.index + 1,
                    plan.part_count
                )));
            }

            let hash = hash_part(self.hasher, &chunk.body);
            debug!(part = chunk.index, %range, checksum = %hash, "uploading part");

            self.send_part(
                session,
                PartUpload {
                    range,
                    checksum: hash,
                    body: chunk.body,
                },
            )
            .await?;

            session.record_part(PartResult {
                index: chunk.index,
                range,
                hash,
            })?;

            self.observer.part_uploaded(&PartProgress {
                current: chunk.index + 1,
                total: plan.part_count,
                bytes_sent: session.bytes_uploaded(),
                total_bytes: plan.total_size,
            });
        }

        if (session.parts().len() as u64) < plan.part_count {
            return Err(ClientError::validation(format!(
                "archive shrank while uploading: read {} of {} bytes",
                reader.offset(),
                plan.total_size
            )));
        }

        Ok(())
    }

    /// One part, retried on transient failures per the retry policy
    async fn send_part(&self, session: &MultipartUpload, part: PartUpload) -> Result<()> {
        let mut attempt = 1;

        loop {
            let result = self
                .service
                .upload_multipart_part(session.target(), session.upload_id(), part.clone())
                .await;

            match result {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        range = %part.range,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        error = %e,
                        "part upload failed, retrying in {:?}",
                        delay
                    );
                    // nothing is in flight during backoff
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = self.cancel.cancelled() => return Err(ClientError::Cancelled),
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(ClientError::Cancelled)
        } else {
            Ok(())
        }
    }
}
