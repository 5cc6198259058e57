//! Core data types for coldvault

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Account that owns a vault.
///
/// The service accepts either a 12 digit account number or a single `-`,
/// meaning "the account the credentials belong to".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new account ID with validation
    pub fn new(id: &str) -> crate::Result<Self> {
        if id == "-" {
            return Ok(AccountId(id.to_string()));
        }

        if id.len() != 12 || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(crate::CoreError::InvalidAccountId(format!(
                "'{}' is neither '-' nor a 12 digit account number",
                id
            )));
        }

        Ok(AccountId(id.to_string()))
    }

    /// The credentials' own account
    pub fn current() -> Self {
        AccountId("-".to_string())
    }

    /// Get the account ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::current()
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Vault name within an account
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VaultName(String);

impl VaultName {
    /// Maximum vault name length accepted by the service
    pub const MAX_LEN: usize = 255;

    /// Create a new vault name with validation
    pub fn new(name: &str) -> crate::Result<Self> {
        if name.is_empty() {
            return Err(crate::CoreError::InvalidVaultName("empty name".to_string()));
        }

        if name.len() > Self::MAX_LEN {
            return Err(crate::CoreError::InvalidVaultName(format!(
                "'{}' is longer than {} characters",
                name,
                Self::MAX_LEN
            )));
        }

        // a-z, A-Z, 0-9, '_', '-' and '.'
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(crate::CoreError::InvalidVaultName(format!(
                "invalid characters in '{}'",
                name
            )));
        }

        Ok(VaultName(name.to_string()))
    }

    /// Get the vault name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VaultName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A vault addressed through its owning account
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VaultTarget {
    pub account_id: AccountId,
    pub vault_name: VaultName,
}

impl VaultTarget {
    pub fn new(account_id: AccountId, vault_name: VaultName) -> Self {
        VaultTarget {
            account_id,
            vault_name,
        }
    }
}

impl std::fmt::Display for VaultTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.account_id, self.vault_name)
    }
}

/// SHA-256 digest used for part checksums and tree hash nodes
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeHash([u8; 32]);

impl TreeHash {
    /// Digest length in bytes
    pub const LEN: usize = 32;

    /// Create from existing hash bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        TreeHash(bytes)
    }

    /// Parse a lowercase or uppercase hex digest
    pub fn from_hex(hex_str: &str) -> crate::Result<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex_str, &mut bytes)
            .map_err(|e| crate::CoreError::InvalidChecksum(format!("'{}': {}", hex_str, e)))?;
        Ok(TreeHash(bytes))
    }

    /// Get hash as bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Get hash as lowercase hex, the form the service expects
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for TreeHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TreeHash({})", self.to_hex())
    }
}

impl std::fmt::Display for TreeHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for TreeHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TreeHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TreeHash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Inclusive byte range of one part within the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Range covering `len` bytes from `start`; `len` must be non-zero
    pub fn new(start: u64, len: u64) -> Self {
        debug_assert!(len > 0, "byte ranges are never empty");
        ByteRange {
            start,
            end: start + len - 1,
        }
    }

    /// Number of bytes covered
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Ranges are inclusive, so never empty
    pub fn is_empty(&self) -> bool {
        false
    }

    /// `Content-Range` header value for an upload-part request
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/*", self.start, self.end)
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.start, self.end)
    }
}

/// Outcome of one acknowledged part upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartResult {
    pub index: u64,
    pub range: ByteRange,
    pub hash: TreeHash,
}
