use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer, Responder, ResponseError};
use log::{info, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::models::{
    AddressResponse, BlockResponse, BlockchainResponse, BulkNodeRequest, ConsensusResponse,
    ErrorResponse, MineResponse, NodeRequest, NoteResponse, ReceiveBlockRequest,
    ReceiveBlockResponse, RelayTransactionRequest, TransactionLookupResponse, TransactionRequest,
    TransactionResponse,
};
use crate::blockchain::Resolution;
use crate::config::NodeConfig;
use crate::error::Error;
use crate::node::Node;

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Network { .. } => StatusCode::BAD_GATEWAY,
            Error::MiningCancelled => StatusCode::SERVICE_UNAVAILABLE,
            Error::EmptyChain | Error::Mining(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

pub async fn alive() -> impl Responder {
    HttpResponse::Ok().body("Node alive")
}

// GET /blockchain: chain, pending pool and membership
pub async fn get_blockchain(node: web::Data<Node>) -> impl Responder {
    HttpResponse::Ok().json(BlockchainResponse {
        snapshot: node.snapshot(),
        current_node_url: node.node_url().to_string(),
        network_nodes: node.peers(),
    })
}

// POST /transaction: queue locally
pub async fn post_transaction(
    node: web::Data<Node>,
    req: web::Json<TransactionRequest>,
) -> Result<HttpResponse, Error> {
    let req = req.into_inner();
    let block_index = node
        .submit_transaction(req.amount, req.sender, req.recipient)
        .await?;
    Ok(HttpResponse::Ok().json(TransactionResponse {
        note: format!("Transaction will be added in block {}.", block_index),
        block_index,
    }))
}

// POST /transaction/broadcast: queue locally and relay to every peer
pub async fn broadcast_transaction(
    node: web::Data<Node>,
    req: web::Json<TransactionRequest>,
) -> Result<HttpResponse, Error> {
    let req = req.into_inner();
    let block_index = node
        .broadcast_transaction(req.amount, req.sender, req.recipient)
        .await?;
    Ok(HttpResponse::Ok().json(TransactionResponse {
        note: "Transaction created and broadcast successfully.".to_string(),
        block_index,
    }))
}

// POST /transaction/relay: a peer hands over a transaction it created
pub async fn relay_transaction(
    node: web::Data<Node>,
    req: web::Json<RelayTransactionRequest>,
) -> Result<HttpResponse, Error> {
    let block_index = node
        .relay_transaction(req.into_inner().new_transaction)
        .await?;
    Ok(HttpResponse::Ok().json(TransactionResponse {
        note: format!("Transaction will be added in block {}.", block_index),
        block_index,
    }))
}

// GET /mine
pub async fn mine(node: web::Data<Node>) -> Result<HttpResponse, Error> {
    let block = node.mine_next_block().await?;
    Ok(HttpResponse::Ok().json(MineResponse {
        note: "New block mined and broadcast successfully".to_string(),
        block,
    }))
}

// POST /receive-new-block: rejection is an answer, not an error
pub async fn receive_new_block(
    node: web::Data<Node>,
    req: web::Json<ReceiveBlockRequest>,
) -> Result<HttpResponse, Error> {
    let receipt = node.receive_block(req.into_inner().new_block).await?;
    let accepted = receipt.is_accepted();
    let note = if accepted {
        "New block received and accepted."
    } else {
        "New block rejected."
    };
    Ok(HttpResponse::Ok().json(ReceiveBlockResponse {
        note: note.to_string(),
        accepted,
    }))
}

// POST /register-and-broadcast-node: bootstrap a new node into the mesh
pub async fn register_and_broadcast_node(
    node: web::Data<Node>,
    req: web::Json<NodeRequest>,
) -> Result<HttpResponse, Error> {
    node.register_and_broadcast(&req.new_node_url).await?;
    Ok(HttpResponse::Ok().json(NoteResponse {
        note: "New node registered with network successfully.".to_string(),
    }))
}

pub async fn register_node(node: web::Data<Node>, req: web::Json<NodeRequest>) -> impl Responder {
    node.register_node(&req.new_node_url).await;
    HttpResponse::Ok().json(NoteResponse {
        note: "New node registered successfully.".to_string(),
    })
}

pub async fn register_nodes_bulk(
    node: web::Data<Node>,
    req: web::Json<BulkNodeRequest>,
) -> impl Responder {
    node.register_nodes_bulk(&req.all_network_nodes).await;
    HttpResponse::Ok().json(NoteResponse {
        note: "Bulk registration successful.".to_string(),
    })
}

// GET /consensus
pub async fn consensus(node: web::Data<Node>) -> Result<HttpResponse, Error> {
    let resolution = node.run_consensus().await?;
    let length = node.chain_length();
    let (note, replaced) = match resolution {
        Resolution::Replaced { .. } => ("This chain has been replaced.", true),
        Resolution::Kept => ("Current chain has not been replaced.", false),
    };
    Ok(HttpResponse::Ok().json(ConsensusResponse {
        note: note.to_string(),
        replaced,
        length,
    }))
}

pub async fn get_block(
    node: web::Data<Node>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let block = node.block_by_hash(&path)?;
    Ok(HttpResponse::Ok().json(BlockResponse { block }))
}

pub async fn get_transaction(
    node: web::Data<Node>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let (transaction, block) = node.transaction_by_id(&path)?;
    Ok(HttpResponse::Ok().json(TransactionLookupResponse { transaction, block }))
}

pub async fn get_address(
    node: web::Data<Node>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let address_data = node.address_summary(&path)?;
    Ok(HttpResponse::Ok().json(AddressResponse { address_data }))
}

pub fn configure_api_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/alive", web::get().to(alive))
        .route("/blockchain", web::get().to(get_blockchain))
        .route("/transaction", web::post().to(post_transaction))
        .route(
            "/transaction/broadcast",
            web::post().to(broadcast_transaction),
        )
        .route("/transaction/relay", web::post().to(relay_transaction))
        .route("/transaction/{id}", web::get().to(get_transaction))
        .route("/mine", web::get().to(mine))
        .route("/receive-new-block", web::post().to(receive_new_block))
        .route(
            "/register-and-broadcast-node",
            web::post().to(register_and_broadcast_node),
        )
        .route("/register-node", web::post().to(register_node))
        .route("/register-nodes-bulk", web::post().to(register_nodes_bulk))
        .route("/consensus", web::get().to(consensus))
        .route("/block/{hash}", web::get().to(get_block))
        .route("/address/{address}", web::get().to(get_address));
}

// Periodic consensus against all peers until the node shuts down
fn spawn_synchronizer(node: Arc<Node>, config: &NodeConfig) -> Option<JoinHandle<()>> {
    let period = config.sync_interval()?;
    let shutdown = node.shutdown_token();

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = node.run_consensus().await {
                        warn!("Error synchronizing chain: {}", e);
                    }
                }
            }
        }
        info!("Chain synchronizer stopped");
    }))
}

// Start server for `node` on the configured address
pub async fn run_server(node: Arc<Node>, config: &NodeConfig) -> std::io::Result<()> {
    let node_data = web::Data::from(node.clone());
    let (host, port) = config.bind_address();
    info!("Starting meshledger node {} on {}:{}", node.node_url(), host, port);

    spawn_synchronizer(node.clone(), config);

    let result = HttpServer::new(move || {
        App::new()
            .app_data(node_data.clone())
            .configure(configure_api_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await;

    node.shutdown();
    result
}
