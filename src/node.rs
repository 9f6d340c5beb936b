//! A single ledger node: the local chain, its peers, and the protocols that
//! keep them in step with the rest of the network.
//!
//! Mutating operations run one at a time behind a write gate. The gate is
//! released before any call goes out to peers, so nodes relaying to each
//! other never wait on one another's gates.

use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::api::client::{fan_out, PeerClient};
use crate::blockchain::{
    mining, resolve, AddressSummary, Block, BlockData, BlockReceipt, ChainSnapshot, Ledger,
    Resolution, Transaction,
};
use crate::config::NodeConfig;
use crate::error::{Error, Result};
use crate::network::PeerRegistry;
use crate::utils::fingerprint;

/// Who this node is on the network. Fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub node_url: String,
    pub reward_address: String,
}

impl NodeIdentity {
    pub fn generate(node_url: impl Into<String>) -> Self {
        Self {
            node_url: node_url.into(),
            reward_address: crate::blockchain::transaction::new_id(),
        }
    }
}

pub struct Node {
    identity: NodeIdentity,
    ledger: Mutex<Ledger>,
    peers: Mutex<PeerRegistry>,
    write_gate: tokio::sync::Mutex<()>,
    client: Arc<dyn PeerClient>,
    mining_reward: f64,
    mining_timeout: Option<Duration>,
    shutdown: CancellationToken,
}

impl Node {
    pub fn new(identity: NodeIdentity, client: Arc<dyn PeerClient>, config: &NodeConfig) -> Self {
        let peers = PeerRegistry::new(identity.node_url.clone());
        Self {
            identity,
            ledger: Mutex::new(Ledger::new()),
            peers: Mutex::new(peers),
            write_gate: tokio::sync::Mutex::new(()),
            client,
            mining_reward: config.mining_reward,
            mining_timeout: config.mining_timeout(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    pub fn node_url(&self) -> &str {
        &self.identity.node_url
    }

    /// Cancels any nonce search in progress and refuses new ones.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /* ---------- reads ---------- */

    pub fn snapshot(&self) -> ChainSnapshot {
        self.ledger.lock().snapshot()
    }

    pub fn chain_length(&self) -> usize {
        self.ledger.lock().len()
    }

    pub fn peers(&self) -> Vec<String> {
        self.peers.lock().peers()
    }

    pub fn block_by_hash(&self, hash: &str) -> Result<Block> {
        self.ledger
            .lock()
            .block_by_hash(hash)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Block {}", hash)))
    }

    pub fn transaction_by_id(&self, id: &str) -> Result<(Transaction, Block)> {
        self.ledger
            .lock()
            .transaction_by_id(id)
            .map(|(tx, block)| (tx.clone(), block.clone()))
            .ok_or_else(|| Error::NotFound(format!("Transaction {}", id)))
    }

    /// Not found when no transaction on the chain touches `address`.
    pub fn address_summary(&self, address: &str) -> Result<AddressSummary> {
        let summary = self.ledger.lock().address_summary(address);
        if summary.transactions.is_empty() {
            return Err(Error::NotFound(format!("Address {}", address)));
        }
        Ok(summary)
    }

    /* ---------- transactions ---------- */

    /// Queues a new transaction locally. Returns the index of the block
    /// expected to embed it.
    pub async fn submit_transaction(
        &self,
        amount: f64,
        sender: String,
        recipient: String,
    ) -> Result<u64> {
        let transaction = Transaction::new(amount, sender, recipient)?;
        self.relay_transaction(transaction).await
    }

    /// Queues a transaction created elsewhere.
    pub async fn relay_transaction(&self, transaction: Transaction) -> Result<u64> {
        transaction.validate()?;
        let _gate = self.write_gate.lock().await;
        self.ledger.lock().add_to_pending_pool(transaction)
    }

    /// Queues a new transaction locally, then hands it to every peer.
    pub async fn broadcast_transaction(
        &self,
        amount: f64,
        sender: String,
        recipient: String,
    ) -> Result<u64> {
        let transaction = Transaction::new(amount, sender, recipient)?;
        let block_index = self.relay_transaction(transaction.clone()).await?;
        self.relay_transaction_to_peers(transaction).await?;
        Ok(block_index)
    }

    async fn relay_transaction_to_peers(&self, transaction: Transaction) -> Result<()> {
        let client = self.client.clone();
        fan_out(self.peers(), move |peer| {
            let client = client.clone();
            let transaction = transaction.clone();
            async move { client.relay_transaction(&peer, &transaction).await }
        })
        .await
        .map(|_| ())
    }

    /* ---------- blocks ---------- */

    /// Mines the pending pool into a new block, appends it, relays it to
    /// every peer and then issues this node's reward.
    ///
    /// The reward goes into the pool after the block is sealed, so it is
    /// embedded by the next block. A failed relay leaves the local block and
    /// reward in place.
    pub async fn mine_next_block(&self) -> Result<Block> {
        let (block, reward) = {
            let _gate = self.write_gate.lock().await;

            let (previous_hash, data) = {
                let ledger = self.ledger.lock();
                (ledger.last_block()?.hash.clone(), ledger.next_block_data()?)
            };

            let nonce = self.search_nonce(&previous_hash, &data).await?;
            let hash = fingerprint(&previous_hash, &data, nonce);

            let reward =
                Transaction::reward(self.mining_reward, self.identity.reward_address.clone())?;
            let mut ledger = self.ledger.lock();
            let block = ledger.append_block(nonce, previous_hash, hash)?;
            ledger.add_to_pending_pool(reward.clone())?;
            (block, reward)
        };
        info!("Mined block #{} ({})", block.index, block.hash);

        let client = self.client.clone();
        let relayed = block.clone();
        let receipts = fan_out(self.peers(), move |peer| {
            let client = client.clone();
            let block = relayed.clone();
            async move { client.relay_block(&peer, &block).await }
        })
        .await?;
        for (peer, receipt) in receipts {
            if !receipt.is_accepted() {
                warn!("Peer {} rejected block #{}", peer, block.index);
            }
        }

        self.relay_transaction_to_peers(reward).await?;
        Ok(block)
    }

    async fn search_nonce(&self, previous_hash: &str, data: &BlockData) -> Result<u64> {
        let cancel = self.shutdown.child_token();
        let search =
            mining::mine_in_background(previous_hash.to_string(), data.clone(), cancel.clone());

        match self.mining_timeout {
            None => search.await,
            Some(limit) => match tokio::time::timeout(limit, search).await {
                Ok(found) => found,
                Err(_) => {
                    cancel.cancel();
                    warn!(
                        "Gave up mining block #{} after {} s",
                        data.index,
                        limit.as_secs()
                    );
                    Err(Error::MiningCancelled)
                }
            },
        }
    }

    pub async fn receive_block(&self, block: Block) -> Result<BlockReceipt> {
        let _gate = self.write_gate.lock().await;
        self.ledger.lock().receive_block(block)
    }

    /* ---------- peers ---------- */

    pub async fn register_node(&self, address: &str) -> bool {
        let _gate = self.write_gate.lock().await;
        self.peers.lock().register(address)
    }

    pub async fn register_nodes_bulk(&self, addresses: &[String]) -> usize {
        let _gate = self.write_gate.lock().await;
        self.peers.lock().register_bulk(addresses)
    }

    /// Brings `new_node_url` into the mesh: registers it here, announces it
    /// to every known peer, then hands it the full membership list.
    pub async fn register_and_broadcast(&self, new_node_url: &str) -> Result<()> {
        if new_node_url.trim().is_empty() {
            return Err(Error::Validation("node url must not be empty".to_string()));
        }
        let known = {
            let peers = self.peers.lock();
            if new_node_url == peers.node_url() {
                return Err(Error::Validation(format!(
                    "{} is this node's own url",
                    new_node_url
                )));
            }
            peers.contains(new_node_url)
        };
        if known {
            debug!("{} is already a peer, announcing it again", new_node_url);
        }

        self.register_node(new_node_url).await;

        let existing: Vec<String> = self
            .peers()
            .into_iter()
            .filter(|peer| peer != new_node_url)
            .collect();
        let client = self.client.clone();
        let announced = new_node_url.to_string();
        fan_out(existing, move |peer| {
            let client = client.clone();
            let announced = announced.clone();
            async move { client.register_node(&peer, &announced).await }
        })
        .await?;

        let mut membership = self.peers();
        membership.push(self.node_url().to_string());
        self.client
            .register_nodes_bulk(new_node_url, &membership)
            .await?;

        info!("{} joined the network", new_node_url);
        Ok(())
    }

    /* ---------- consensus ---------- */

    /// Collects every peer's snapshot and applies the longest-valid-chain
    /// rule. Fails if any peer cannot be reached.
    pub async fn run_consensus(&self) -> Result<Resolution> {
        let peers = self.peers();
        if peers.is_empty() {
            return Ok(Resolution::Kept);
        }

        let client = self.client.clone();
        let snapshots: Vec<ChainSnapshot> = fan_out(peers, move |peer| {
            let client = client.clone();
            async move { client.fetch_snapshot(&peer).await }
        })
        .await?
        .into_iter()
        .map(|(_, snapshot)| snapshot)
        .collect();

        let _gate = self.write_gate.lock().await;
        let mut ledger = self.ledger.lock();
        Ok(resolve(&mut ledger, snapshots))
    }
}
