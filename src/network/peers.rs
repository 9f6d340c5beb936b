use log::info;
use std::collections::BTreeSet;

/// Known peer URLs. Never holds this node's own URL.
#[derive(Debug, Clone)]
pub struct PeerRegistry {
    node_url: String,
    nodes: BTreeSet<String>,
}

impl PeerRegistry {
    pub fn new(node_url: impl Into<String>) -> Self {
        Self {
            node_url: node_url.into(),
            nodes: BTreeSet::new(),
        }
    }

    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    /// Returns whether `address` was new.
    pub fn register(&mut self, address: &str) -> bool {
        if address == self.node_url {
            return false;
        }
        let added = self.nodes.insert(address.to_string());
        if added {
            info!("Registered peer {}", address);
        }
        added
    }

    /// Returns how many of `addresses` were new.
    pub fn register_bulk<I, S>(&mut self, addresses: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        addresses
            .into_iter()
            .filter(|address| self.register(address.as_ref()))
            .count()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.nodes.contains(address)
    }

    /// Sorted peer URLs.
    pub fn peers(&self) -> Vec<String> {
        self.nodes.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
