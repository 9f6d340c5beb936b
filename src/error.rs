use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Chain has no blocks")]
    EmptyChain,
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Peer {peer} failed: {reason}")]
    Network { peer: String, reason: String },
    #[error("Mining cancelled")]
    MiningCancelled,
    #[error("Mining task failed: {0}")]
    Mining(String),
}

impl Error {
    pub fn network(peer: &str, reason: impl ToString) -> Self {
        Error::Network {
            peer: peer.to_string(),
            reason: reason.to_string(),
        }
    }
}
