//! Shard selection function

use sha2::{Digest, Sha256};

/// Index of the node owning `value` among `node_count` nodes.
///
/// SHA-256 of the value text, first 8 bytes big-endian, modulo the node
/// count. Numeric and quoted forms of a literal must be normalized by the
/// caller (`1` and `'1'` are both passed as `"1"`). `None` when there are no
/// nodes.
pub fn hash_mod_index(value: &str, node_count: usize) -> Option<usize> {
    if node_count == 0 {
        return None;
    }

    let digest = Sha256::digest(value.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    Some((u64::from_be_bytes(prefix) % node_count as u64) as usize)
}
