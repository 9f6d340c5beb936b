use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinSet;

use super::models::{
    BulkNodeRequest, NodeRequest, NoteResponse, ReceiveBlockRequest, ReceiveBlockResponse,
    RelayTransactionRequest, TransactionResponse,
};
use crate::blockchain::{Block, BlockReceipt, ChainSnapshot, Transaction};
use crate::error::{Error, Result};

/// Outbound calls a node makes to its peers.
///
/// Every failure, including a non-success response, surfaces as
/// [`Error::Network`]. A peer rejecting a relayed block is an answer, not a
/// failure.
#[async_trait]
pub trait PeerClient: Send + Sync {
    async fn register_node(&self, peer: &str, new_node_url: &str) -> Result<()>;

    async fn register_nodes_bulk(&self, peer: &str, node_urls: &[String]) -> Result<()>;

    async fn relay_transaction(&self, peer: &str, transaction: &Transaction) -> Result<()>;

    async fn relay_block(&self, peer: &str, block: &Block) -> Result<BlockReceipt>;

    async fn fetch_snapshot(&self, peer: &str) -> Result<ChainSnapshot>;
}

/// Calls `call` for every peer concurrently and waits for all of them.
///
/// Results come back in the order of `peers`. If any call failed the whole
/// batch fails with the first failure in that order; calls that succeeded
/// are not undone.
pub async fn fan_out<T, F, Fut>(peers: Vec<String>, call: F) -> Result<Vec<(String, T)>>
where
    T: Send + 'static,
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    for (position, peer) in peers.into_iter().enumerate() {
        let request = call(peer.clone());
        tasks.spawn(async move { (position, peer, request.await) });
    }

    let mut outcomes = Vec::with_capacity(tasks.len());
    let mut crashed = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                warn!("Peer call task failed: {}", e);
                crashed.get_or_insert(Error::network("<task>", e));
            }
        }
    }
    outcomes.sort_by_key(|(position, _, _)| *position);

    let mut results = Vec::with_capacity(outcomes.len());
    let mut first_failure = None;
    for (_, peer, outcome) in outcomes {
        match outcome {
            Ok(value) => results.push((peer, value)),
            Err(e) => {
                warn!("Peer call to {} failed: {}", peer, e);
                first_failure.get_or_insert(e);
            }
        }
    }

    match first_failure.or(crashed) {
        Some(e) => Err(e),
        None => Ok(results),
    }
}

/// [`PeerClient`] speaking JSON over HTTP to the routes in `api::server`.
#[derive(Clone)]
pub struct HttpPeerClient {
    client: Client,
}

impl HttpPeerClient {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::network("<client>", e))?;
        Ok(Self { client })
    }

    fn url(peer: &str, path: &str) -> String {
        format!("{}{}", peer.trim_end_matches('/'), path)
    }

    async fn post<B, R>(&self, peer: &str, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!("POST {}{}", peer, path);
        self.client
            .post(Self::url(peer, path))
            .json(body)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| Error::network(peer, e))?
            .json::<R>()
            .await
            .map_err(|e| Error::network(peer, e))
    }

    async fn get<R: DeserializeOwned>(&self, peer: &str, path: &str) -> Result<R> {
        debug!("GET {}{}", peer, path);
        self.client
            .get(Self::url(peer, path))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| Error::network(peer, e))?
            .json::<R>()
            .await
            .map_err(|e| Error::network(peer, e))
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn register_node(&self, peer: &str, new_node_url: &str) -> Result<()> {
        let body = NodeRequest {
            new_node_url: new_node_url.to_string(),
        };
        self.post::<_, NoteResponse>(peer, "/register-node", &body)
            .await
            .map(|_| ())
    }

    async fn register_nodes_bulk(&self, peer: &str, node_urls: &[String]) -> Result<()> {
        let body = BulkNodeRequest {
            all_network_nodes: node_urls.to_vec(),
        };
        self.post::<_, NoteResponse>(peer, "/register-nodes-bulk", &body)
            .await
            .map(|_| ())
    }

    async fn relay_transaction(&self, peer: &str, transaction: &Transaction) -> Result<()> {
        let body = RelayTransactionRequest {
            new_transaction: transaction.clone(),
        };
        self.post::<_, TransactionResponse>(peer, "/transaction/relay", &body)
            .await
            .map(|_| ())
    }

    async fn relay_block(&self, peer: &str, block: &Block) -> Result<BlockReceipt> {
        let body = ReceiveBlockRequest {
            new_block: block.clone(),
        };
        let response: ReceiveBlockResponse =
            self.post(peer, "/receive-new-block", &body).await?;
        Ok(if response.accepted {
            BlockReceipt::Accepted
        } else {
            BlockReceipt::Rejected
        })
    }

    async fn fetch_snapshot(&self, peer: &str) -> Result<ChainSnapshot> {
        self.get(peer, "/blockchain").await
    }
}
