use clap::Parser;
use std::time::Duration;

pub const DEFAULT_MINING_REWARD: f64 = 12.5;

/// Node settings. Every flag can also come from the environment (or a
/// `.env` file).
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = "Replicated proof-of-work ledger node")]
pub struct NodeConfig {
    /// Port the HTTP API listens on.
    #[arg(env = "PORT", default_value_t = 3001)]
    pub port: u16,
    /// Interface the HTTP API binds to.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,
    /// URL peers use to reach this node. Defaults to `http://{host}:{port}`.
    #[arg(long, env = "NODE_URL")]
    pub node_url: Option<String>,
    /// Amount issued to this node for every block it mines.
    #[arg(long, env = "MINING_REWARD", default_value_t = DEFAULT_MINING_REWARD)]
    pub mining_reward: f64,
    /// Abandon a nonce search after this many seconds.
    #[arg(long, env = "MINING_TIMEOUT_SECS")]
    pub mining_timeout_secs: Option<u64>,
    /// Run consensus against all peers this often. 0 disables.
    #[arg(long, env = "SYNC_INTERVAL_SECS", default_value_t = 0)]
    pub sync_interval_secs: u64,
    /// Per-request timeout for calls to peers.
    #[arg(long, env = "PEER_TIMEOUT_SECS")]
    pub peer_timeout_secs: Option<u64>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            host: "127.0.0.1".to_string(),
            node_url: None,
            mining_reward: DEFAULT_MINING_REWARD,
            mining_timeout_secs: None,
            sync_interval_secs: 0,
            peer_timeout_secs: None,
        }
    }
}

impl NodeConfig {
    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    pub fn node_url(&self) -> String {
        self.node_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.host, self.port))
    }

    pub fn mining_timeout(&self) -> Option<Duration> {
        self.mining_timeout_secs.map(Duration::from_secs)
    }

    pub fn sync_interval(&self) -> Option<Duration> {
        (self.sync_interval_secs > 0).then(|| Duration::from_secs(self.sync_interval_secs))
    }

    pub fn peer_timeout(&self) -> Option<Duration> {
        self.peer_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positional_port_and_flags() {
        let config = NodeConfig::try_parse_from([
            "meshledger",
            "3005",
            "--node-url",
            "http://node-5:3005",
            "--mining-timeout-secs",
            "30",
            "--sync-interval-secs",
            "10",
        ])
        .unwrap();

        assert_eq!(config.port, 3005);
        assert_eq!(config.node_url(), "http://node-5:3005");
        assert_eq!(config.mining_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.sync_interval(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn node_url_defaults_to_bind_address() {
        let config = NodeConfig {
            port: 4000,
            ..NodeConfig::default()
        };
        assert_eq!(config.node_url(), "http://127.0.0.1:4000");
        assert_eq!(config.sync_interval(), None);
        assert_eq!(config.mining_reward, 12.5);
    }
}
