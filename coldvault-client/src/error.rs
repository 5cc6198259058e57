//! Client error types

use thiserror::Error;

/// What went wrong on the service side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    NotFound,
    ChecksumMismatch,
    RangeConflict,
    SizeMismatch,
    Throttled,
    Transport,
    Other,
}

impl RemoteErrorKind {
    /// Failures worth another attempt with the same request
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteErrorKind::Throttled | RemoteErrorKind::Transport)
    }
}

impl std::fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RemoteErrorKind::NotFound => "not found",
            RemoteErrorKind::ChecksumMismatch => "checksum mismatch",
            RemoteErrorKind::RangeConflict => "range conflict",
            RemoteErrorKind::SizeMismatch => "size mismatch",
            RemoteErrorKind::Throttled => "throttled",
            RemoteErrorKind::Transport => "transport error",
            RemoteErrorKind::Other => "service error",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{operation} failed ({kind}): {message}")]
    Remote {
        operation: &'static str,
        kind: RemoteErrorKind,
        message: String,
    },

    #[error("Cancelled by operator")]
    Cancelled,

    #[error("Core error: {0}")]
    Core(#[from] coldvault_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn remote(operation: &'static str, kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        ClientError::Remote {
            operation,
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    /// Remote failure kind, if this is a remote failure
    pub fn remote_kind(&self) -> Option<RemoteErrorKind> {
        match self {
            ClientError::Remote { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        self.remote_kind().is_some_and(|kind| kind.is_transient())
    }

    /// Bad local input rather than a service or cancellation failure
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ClientError::Validation(_) | ClientError::Core(_) | ClientError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_kinds() {
        assert!(ClientError::remote("UploadMultipartPart", RemoteErrorKind::Throttled, "slow down").is_transient());
        assert!(ClientError::remote("UploadMultipartPart", RemoteErrorKind::Transport, "reset").is_transient());
        assert!(!ClientError::remote("UploadMultipartPart", RemoteErrorKind::ChecksumMismatch, "bad").is_transient());
        assert!(!ClientError::Cancelled.is_transient());
    }

    #[test]
    fn test_remote_display_names_operation() {
        let err = ClientError::remote("DescribeVault", RemoteErrorKind::NotFound, "no such vault");
        assert_eq!(err.to_string(), "DescribeVault failed (not found): no such vault");
    }
}
