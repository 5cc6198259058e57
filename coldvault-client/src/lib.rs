//! coldvault client SDK
//!
//! Vault management calls plus a cancellable, sequential multipart upload
//! pipeline over [`GlacierService`].

pub mod aws;
pub mod client;
pub mod config;
pub mod error;
pub mod multipart;
pub mod orchestrator;
pub mod progress;
pub mod retry;
pub mod service;
pub mod streaming;
pub mod uploader;

pub use aws::AwsGlacier;
pub use client::Client;
pub use config::ClientConfig;
pub use error::{ClientError, RemoteErrorKind};
pub use multipart::MultipartUpload;
pub use orchestrator::{
    AbortOutcome, UploadFailure, UploadOrchestrator, UploadReceipt, UploadRequest, UploadStage,
};
pub use progress::{LogProgress, NoProgress, PartProgress, ProgressObserver};
pub use retry::RetryPolicy;
pub use service::{
    ArchiveReceipt, GlacierService, JobSummary, MultipartUploadSummary, PartUpload, VaultDescription,
};
pub use streaming::{PartChunk, PartReader};
pub use uploader::PartUploader;

pub type Result<T> = std::result::Result<T, ClientError>;
