use hex;
use sha2::{Digest, Sha256};

use crate::blockchain::BlockData;

/// Number of leading `'0'` hex characters a mined block hash must carry.
pub const DIFFICULTY: usize = 4;

/// Fingerprint of a block's linkage, content and nonce.
///
/// The preimage is `previous_hash`, then the nonce in decimal, then the
/// compact JSON of `data`. JSON field order follows the declaration order of
/// `BlockData` and `Transaction`, so every node produces the same bytes for
/// the same logical block.
pub fn fingerprint(previous_hash: &str, data: &BlockData, nonce: u64) -> String {
    // Strings, integers and floats only: serialization cannot fail.
    let data = serde_json::to_string(data).unwrap_or_default();

    let mut hasher = Sha256::new();

    hasher.update(previous_hash.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hasher.update(data.as_bytes());

    let result = hasher.finalize();

    hex::encode(result)
}

pub fn meets_difficulty(digest: &str) -> bool {
    digest.len() >= DIFFICULTY && digest.bytes().take(DIFFICULTY).all(|b| b == b'0')
}
