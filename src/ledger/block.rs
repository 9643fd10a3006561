//! Block construction and the chain's hash function

use sha2::{Digest, Sha256};

use crate::types::*;

/// Hash the four linked fields of a block.
///
/// SHA-256 over the UTF-8 bytes of
/// `"{index}|{previous_hash}|{timestamp}|{canonical payload}"`, hex encoded in
/// lowercase. The separator cannot occur in the first three fields, so the
/// encoding is unambiguous.
pub fn calculate_hash(
    index: u64,
    previous_hash: &str,
    timestamp: i64,
    payload: &BlockPayload,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(index.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(previous_hash.as_bytes());
    hasher.update(b"|");
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(payload.canonical().as_bytes());
    hex::encode(hasher.finalize())
}

impl Block {
    /// Build a block and seal it with its hash
    pub fn new(index: u64, previous_hash: String, timestamp: i64, payload: BlockPayload) -> Self {
        let hash = calculate_hash(index, &previous_hash, timestamp, &payload);
        Self {
            index,
            timestamp,
            payload,
            hash,
            previous_hash,
        }
    }

    /// The first block of every chain
    pub fn genesis(timestamp: i64) -> Self {
        Self::new(
            0,
            GENESIS_PREVIOUS_HASH.to_string(),
            timestamp,
            BlockPayload::Text(GENESIS_PAYLOAD.to_string()),
        )
    }

    /// Recompute the hash from the stored fields
    pub fn compute_hash(&self) -> String {
        calculate_hash(self.index, &self.previous_hash, self.timestamp, &self.payload)
    }

    /// Whether the stored hash matches the stored fields
    pub fn has_valid_hash(&self) -> bool {
        self.compute_hash() == self.hash
    }
}
