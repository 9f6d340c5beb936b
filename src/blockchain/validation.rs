use super::Block;
use crate::utils::{fingerprint, meets_difficulty};

/// Checks `block` against its predecessor: linkage, index succession,
/// recomputed fingerprint and difficulty.
pub fn is_valid_block(block: &Block, previous_block: &Block) -> bool {
    if block.previous_block_hash != previous_block.hash {
        return false;
    }

    if block.index != previous_block.index + 1 {
        return false;
    }

    let calculated_hash = fingerprint(&previous_block.hash, &block.data(), block.nonce);
    if block.hash != calculated_hash {
        return false;
    }

    meets_difficulty(&block.hash)
}

pub fn is_valid_chain(chain: &[Block]) -> bool {
    let Some(genesis) = chain.first() else {
        return false;
    };
    if !genesis.is_genesis() {
        return false;
    }

    chain
        .windows(2)
        .all(|pair| is_valid_block(&pair[1], &pair[0]))
}
