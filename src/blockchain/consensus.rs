use log::{info, warn};

use super::validation::is_valid_chain;
use super::{ChainSnapshot, Ledger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Replaced { length: usize },
    Kept,
}

/// Longest-valid-chain rule.
///
/// Picks the longest snapshot (the first one wins a tie) and adopts its
/// chain and pool when it is strictly longer than the local chain and valid.
/// A longest candidate that fails validation is dropped without falling back
/// to shorter ones.
pub fn resolve(ledger: &mut Ledger, snapshots: Vec<ChainSnapshot>) -> Resolution {
    let local_length = ledger.len();

    let mut longest: Option<ChainSnapshot> = None;
    for snapshot in snapshots {
        let is_longer = longest
            .as_ref()
            .map_or(true, |best| snapshot.chain.len() > best.chain.len());
        if is_longer {
            longest = Some(snapshot);
        }
    }

    let Some(candidate) = longest else {
        return Resolution::Kept;
    };

    let length = candidate.chain.len();
    if length <= local_length {
        return Resolution::Kept;
    }

    if !is_valid_chain(&candidate.chain) {
        warn!(
            "Longest peer chain ({} blocks) failed validation; keeping local chain ({} blocks)",
            length, local_length
        );
        return Resolution::Kept;
    }

    ledger.replace(candidate);
    info!("Chain replaced. New length {}", length);
    Resolution::Replaced { length }
}
