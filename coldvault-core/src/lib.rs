//! Core data models, partition planning and tree hashing for coldvault

pub mod error;
pub mod plan;
pub mod tree_hash;
pub mod types;

pub use error::*;
pub use plan::{ArchivePlan, MAX_PARTS, MAX_PART_SIZE, MIN_PART_SIZE};
pub use tree_hash::{combine, hash_part, tree_hash_reader, Sha256Hasher, TreeHasher, LEAF_SIZE};
pub use types::*;

/// Result type alias for coldvault core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vault_name_creation() {
        let vault = VaultName::new("my-vault").unwrap();
        assert_eq!(vault.as_str(), "my-vault");
    }

    #[test]
    fn test_vault_name_validation() {
        // Valid vault names
        assert!(VaultName::new("vault").is_ok());
        assert!(VaultName::new("vault-123").is_ok());
        assert!(VaultName::new("vault_123.backup").is_ok());

        // Invalid vault names
        assert!(VaultName::new("").is_err());
        assert!(VaultName::new("vault with spaces").is_err());
        assert!(VaultName::new("vault/with/slashes").is_err());
        assert!(VaultName::new(&"v".repeat(256)).is_err());
    }

    #[test]
    fn test_account_id_validation() {
        assert_eq!(AccountId::new("-").unwrap(), AccountId::current());
        assert!(AccountId::new("548523034351").is_ok());

        assert!(AccountId::new("").is_err());
        assert!(AccountId::new("12345").is_err());
        assert!(AccountId::new("54852303435x").is_err());
    }

    #[test]
    fn test_vault_target_display() {
        let target = VaultTarget::new(AccountId::current(), VaultName::new("photos").unwrap());
        assert_eq!(target.to_string(), "-/photos");
    }

    #[test]
    fn test_tree_hash_hex_roundtrip_and_case() {
        let hash = Sha256Hasher.hash(b"test data");
        let parsed = TreeHash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(parsed, hash);

        let upper = TreeHash::from_hex(&hash.to_hex().to_uppercase()).unwrap();
        assert_eq!(upper, hash);

        assert!(TreeHash::from_hex("abc").is_err());
        assert!(TreeHash::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn test_tree_hash_serializes_as_hex() {
        let hash = Sha256Hasher.hash(b"");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(
            json,
            "\"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855\""
        );
        let back: TreeHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn test_byte_range_content_range() {
        let range = ByteRange::new(1048576, 1048576);
        assert_eq!(range.end, 2097151);
        assert_eq!(range.len(), 1048576);
        assert_eq!(range.content_range(), "bytes 1048576-2097151/*");
    }
}
