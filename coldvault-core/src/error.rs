//! Error types for coldvault-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid vault name: {0}")]
    InvalidVaultName(String),

    #[error("Invalid account id: {0}")]
    InvalidAccountId(String),

    #[error("Invalid checksum: {0}")]
    InvalidChecksum(String),

    #[error("Tree hash requires at least one leaf")]
    EmptyTreeHash,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
