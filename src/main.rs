use clap::Parser;
use log::error;
use std::process::exit;
use std::sync::Arc;

use meshledger::api::{run_server, HttpPeerClient};
use meshledger::config::NodeConfig;
use meshledger::{Node, NodeIdentity};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = NodeConfig::parse();
    let identity = NodeIdentity::generate(config.node_url());
    log::info!("Reward address for this node: {}", identity.reward_address);

    let client = match HttpPeerClient::new(config.peer_timeout()) {
        Ok(client) => client,
        Err(e) => {
            error!("Cannot build peer client: {}", e);
            exit(1);
        }
    };

    let node = Arc::new(Node::new(identity, Arc::new(client), &config));
    run_server(node, &config).await
}
