use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::Transaction;

pub const GENESIS_INDEX: u64 = 1;
pub const GENESIS_NONCE: u64 = 100;
pub const GENESIS_HASH: &str = "0";
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// The part of a block its fingerprint commits to, besides linkage and nonce.
// Field order is part of the fingerprint preimage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockData {
    pub transactions: Vec<Transaction>,
    pub index: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub transactions: Vec<Transaction>,
    pub nonce: u64,
    pub hash: String,
    pub previous_block_hash: String,
}

impl Block {
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        nonce: u64,
        previous_block_hash: String,
        hash: String,
    ) -> Block {
        let timestamp = Utc::now().timestamp_millis();

        Block {
            index,
            timestamp,
            transactions,
            nonce,
            hash,
            previous_block_hash,
        }
    }

    pub fn genesis() -> Block {
        Block::new(
            GENESIS_INDEX,
            Vec::new(),
            GENESIS_NONCE,
            GENESIS_PREVIOUS_HASH.to_string(),
            GENESIS_HASH.to_string(),
        )
    }

    /// Genesis constants; the timestamp is not part of them.
    pub fn is_genesis(&self) -> bool {
        self.index == GENESIS_INDEX
            && self.nonce == GENESIS_NONCE
            && self.hash == GENESIS_HASH
            && self.previous_block_hash == GENESIS_PREVIOUS_HASH
            && self.transactions.is_empty()
    }

    pub fn data(&self) -> BlockData {
        BlockData {
            transactions: self.transactions.clone(),
            index: self.index,
        }
    }
}
