use log::debug;
use tokio_util::sync::CancellationToken;

use super::BlockData;
use crate::error::{Error, Result};
use crate::utils::{fingerprint, meets_difficulty};

const CANCEL_POLL_INTERVAL: u64 = 1024;

/// Searches nonces upward from zero until the fingerprint meets the
/// difficulty target. Never gives up.
pub fn mine(previous_hash: &str, data: &BlockData) -> u64 {
    let mut nonce = 0u64;
    loop {
        if meets_difficulty(&fingerprint(previous_hash, data, nonce)) {
            return nonce;
        }
        nonce += 1;
    }
}

/// Same search as [`mine`], checking `cancel` every few attempts.
/// Returns `None` once the token has been cancelled.
pub fn mine_until_cancelled(
    previous_hash: &str,
    data: &BlockData,
    cancel: &CancellationToken,
) -> Option<u64> {
    let mut nonce = 0u64;
    loop {
        if nonce % CANCEL_POLL_INTERVAL == 0 && cancel.is_cancelled() {
            debug!("Nonce search for block #{} cancelled at {}", data.index, nonce);
            return None;
        }
        if meets_difficulty(&fingerprint(previous_hash, data, nonce)) {
            return Some(nonce);
        }
        nonce += 1;
    }
}

/// Runs the nonce search on the blocking pool so the async runtime keeps
/// serving requests.
pub async fn mine_in_background(
    previous_hash: String,
    data: BlockData,
    cancel: CancellationToken,
) -> Result<u64> {
    let index = data.index;
    let started = std::time::Instant::now();

    let found = tokio::task::spawn_blocking(move || {
        mine_until_cancelled(&previous_hash, &data, &cancel)
    })
    .await
    .map_err(|e| Error::Mining(e.to_string()))?;

    match found {
        Some(nonce) => {
            debug!(
                "Found nonce {} for block #{} in {} ms",
                nonce,
                index,
                started.elapsed().as_millis()
            );
            Ok(nonce)
        }
        None => Err(Error::MiningCancelled),
    }
}
