//! SHA-256 tree hash
//!
//! Archives and parts are checksummed with a binary Merkle tree: data is
//! split into 1 MiB leaves, each leaf is hashed, and adjacent digests are
//! hashed together level by level until one root remains. A digest
//! without a partner on its level is carried up unchanged.

use std::io::Read;

use sha2::{Digest, Sha256};

use crate::plan::MIN_PART_SIZE;
use crate::{CoreError, Result, TreeHash};

/// Size of a tree hash leaf
pub const LEAF_SIZE: usize = MIN_PART_SIZE as usize;

/// Hash primitive used for leaves and for combining node pairs
pub trait TreeHasher: Send + Sync {
    fn hash(&self, data: &[u8]) -> TreeHash;

    /// Parent node of two adjacent digests
    fn hash_pair(&self, left: &TreeHash, right: &TreeHash) -> TreeHash {
        let mut joined = [0u8; TreeHash::LEN * 2];
        joined[..TreeHash::LEN].copy_from_slice(left.as_bytes());
        joined[TreeHash::LEN..].copy_from_slice(right.as_bytes());
        self.hash(&joined)
    }
}

/// SHA-256, the only algorithm the service accepts
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl TreeHasher for Sha256Hasher {
    fn hash(&self, data: &[u8]) -> TreeHash {
        TreeHash::from_bytes(Sha256::digest(data).into())
    }
}

/// Reduce an ordered list of digests to the tree root.
///
/// Pairs are combined left to right as `H(first || second)`; an odd
/// trailing digest moves to the next level unchanged.
pub fn combine(hasher: &dyn TreeHasher, leaves: &[TreeHash]) -> Result<TreeHash> {
    if leaves.is_empty() {
        return Err(CoreError::EmptyTreeHash);
    }

    Ok(reduce(hasher, leaves.to_vec()))
}

/// `level` must be non-empty
fn reduce(hasher: &dyn TreeHasher, mut level: Vec<TreeHash>) -> TreeHash {
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => hasher.hash_pair(left, right),
                [carried] => *carried,
                _ => unreachable!("chunks(2) yields one or two digests"),
            })
            .collect();
    }

    level[0]
}

/// Checksum of a single part body as sent with upload-part.
///
/// An empty body hashes to the digest of no bytes.
pub fn hash_part(hasher: &dyn TreeHasher, body: &[u8]) -> TreeHash {
    if body.len() <= LEAF_SIZE {
        return hasher.hash(body);
    }

    reduce(hasher, body.chunks(LEAF_SIZE).map(|leaf| hasher.hash(leaf)).collect())
}

/// Tree hash of everything readable from `reader`
pub fn tree_hash_reader<R: Read>(hasher: &dyn TreeHasher, mut reader: R) -> Result<TreeHash> {
    let mut leaves = Vec::new();
    let mut buf = vec![0u8; LEAF_SIZE];

    loop {
        let n = read_full(&mut reader, &mut buf)?;
        if n == 0 {
            break;
        }
        leaves.push(hasher.hash(&buf[..n]));
        if n < LEAF_SIZE {
            break;
        }
    }

    if leaves.is_empty() {
        return Ok(hasher.hash(&[]));
    }
    Ok(reduce(hasher, leaves))
}

/// Fill `buf` unless EOF comes first; returns bytes read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::result::Result<usize, CoreError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
