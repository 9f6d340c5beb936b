//! In-process network: every peer call is dispatched straight to the target
//! `Node`, and any node can be marked unreachable.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use meshledger::api::PeerClient;
use meshledger::blockchain::{Block, BlockReceipt, ChainSnapshot, Transaction};
use meshledger::config::NodeConfig;
use meshledger::{Error, Node, NodeIdentity, Result};

#[derive(Default)]
pub struct LocalNetwork {
    nodes: RwLock<HashMap<String, Arc<Node>>>,
    unreachable: RwLock<HashSet<String>>,
}

impl LocalNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn spawn_node(self: &Arc<Self>, url: &str) -> Arc<Node> {
        let client: Arc<dyn PeerClient> = self.clone();
        let node = Arc::new(Node::new(
            NodeIdentity::generate(url),
            client,
            &NodeConfig::default(),
        ));
        self.nodes.write().insert(url.to_string(), node.clone());
        node
    }

    pub fn set_reachable(&self, url: &str, reachable: bool) {
        let mut unreachable = self.unreachable.write();
        if reachable {
            unreachable.remove(url);
        } else {
            unreachable.insert(url.to_string());
        }
    }

    fn node(&self, peer: &str) -> Result<Arc<Node>> {
        if self.unreachable.read().contains(peer) {
            return Err(Error::network(peer, "connection refused"));
        }
        self.nodes
            .read()
            .get(peer)
            .cloned()
            .ok_or_else(|| Error::network(peer, "no such host"))
    }
}

#[async_trait]
impl PeerClient for LocalNetwork {
    async fn register_node(&self, peer: &str, new_node_url: &str) -> Result<()> {
        let node = self.node(peer)?;
        node.register_node(new_node_url).await;
        Ok(())
    }

    async fn register_nodes_bulk(&self, peer: &str, node_urls: &[String]) -> Result<()> {
        let node = self.node(peer)?;
        node.register_nodes_bulk(node_urls).await;
        Ok(())
    }

    async fn relay_transaction(&self, peer: &str, transaction: &Transaction) -> Result<()> {
        let node = self.node(peer)?;
        node.relay_transaction(transaction.clone()).await.map(|_| ())
    }

    async fn relay_block(&self, peer: &str, block: &Block) -> Result<BlockReceipt> {
        let node = self.node(peer)?;
        node.receive_block(block.clone()).await
    }

    async fn fetch_snapshot(&self, peer: &str) -> Result<ChainSnapshot> {
        Ok(self.node(peer)?.snapshot())
    }
}

pub fn url(n: usize) -> String {
    format!("http://node-{}", n)
}

/// Spawns `count` nodes, each joining through the previous one.
pub async fn meshed(network: &Arc<LocalNetwork>, count: usize) -> Vec<Arc<Node>> {
    let nodes: Vec<Arc<Node>> = (0..count).map(|n| network.spawn_node(&url(n))).collect();
    for n in 1..count {
        nodes[n - 1]
            .register_and_broadcast(&url(n))
            .await
            .expect("mesh join");
    }
    nodes
}
