//! Content-addressed hashing for logic trees.
//!
//! A node's hash covers its connective and the hashes of its children (or
//! the structure of its term), never its allocation. Two trees built
//! independently with the same shape hash identically, which is what lets
//! the satisfiability cache answer repeated queries on fresh instances.

use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 content hash.
pub type ContentHash = [u8; 32];

/// Hash a tag followed by a sequence of byte parts.
///
/// Each part is length-prefixed so that `["ab", "c"]` and `["a", "bc"]`
/// do not collide.
pub fn tagged_hash<'a, I>(tag: &str, parts: I) -> ContentHash
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut hasher = Sha256::new();
    hasher.update(tag.as_bytes());
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Format a content hash as a hex string.
pub fn hash_hex(hash: &ContentHash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}
