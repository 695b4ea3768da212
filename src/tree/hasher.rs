//! Digest primitives using BLAKE3
//!
//! Everything the tree stores is a hex string; callers compare digests for
//! equality and never look inside them.

use crate::types::Hash;
use blake3::Hasher;

/// Size of each window read by the partial content hash.
pub const SAMPLE_WINDOW: u64 = 64 * 1024;

/// Compute the digest of a directory from its children's digests.
///
/// Children are hashed in the order given. Two directories holding the same
/// children in a different order get different digests: listing order is
/// part of a directory's identity.
pub fn aggregate_hash<'a, I>(child_hashes: I) -> Hash
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hasher = Hasher::new();
    for child in child_hashes {
        hasher.update(child.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}

/// Byte ranges `(offset, len)` sampled from a file of `file_len` bytes.
///
/// Small files are read whole; larger ones contribute a head, middle and
/// tail window.
pub fn sample_ranges(file_len: u64) -> Vec<(u64, u64)> {
    if file_len <= 3 * SAMPLE_WINDOW {
        return vec![(0, file_len)];
    }
    let middle = file_len / 2 - SAMPLE_WINDOW / 2;
    vec![
        (0, SAMPLE_WINDOW),
        (middle, SAMPLE_WINDOW),
        (file_len - SAMPLE_WINDOW, SAMPLE_WINDOW),
    ]
}

/// Combine the sampled windows of a file into its partial content digest.
pub fn partial_hash<'a, I>(file_len: u64, samples: I) -> Hash
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut hasher = Hasher::new();
    hasher.update(&file_len.to_be_bytes());
    for sample in samples {
        hasher.update(sample);
    }
    hex::encode(hasher.finalize().as_bytes())
}

/// Partial content digest of an in-memory buffer.
pub fn partial_hash_bytes(content: &[u8]) -> Hash {
    let len = content.len() as u64;
    let ranges = sample_ranges(len);
    partial_hash(
        len,
        ranges
            .iter()
            .map(|&(offset, size)| &content[offset as usize..(offset + size) as usize]),
    )
}
