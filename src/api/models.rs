use serde::{Deserialize, Serialize};

use crate::blockchain::{AddressSummary, Block, ChainSnapshot, Transaction};

/* ---------- Transactions ---------- */

#[derive(Serialize, Deserialize)]
pub struct TransactionRequest {
    pub amount: f64,
    pub sender: String,
    pub recipient: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayTransactionRequest {
    pub new_transaction: Transaction,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub note: String,
    pub block_index: u64,
}

/* ---------- Blocks ---------- */

#[derive(Serialize, Deserialize)]
pub struct MineResponse {
    pub note: String,
    pub block: Block,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveBlockRequest {
    pub new_block: Block,
}

#[derive(Serialize, Deserialize)]
pub struct ReceiveBlockResponse {
    pub note: String,
    pub accepted: bool,
}

/* ---------- Nodes ---------- */

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRequest {
    pub new_node_url: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkNodeRequest {
    pub all_network_nodes: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct NoteResponse {
    pub note: String,
}

/* ---------- Chain ---------- */

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainResponse {
    #[serde(flatten)]
    pub snapshot: ChainSnapshot,
    pub current_node_url: String,
    pub network_nodes: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ConsensusResponse {
    pub note: String,
    pub replaced: bool,
    pub length: usize,
}

/* ---------- Explorer ---------- */

#[derive(Serialize, Deserialize)]
pub struct BlockResponse {
    pub block: Block,
}

#[derive(Serialize, Deserialize)]
pub struct TransactionLookupResponse {
    pub transaction: Transaction,
    pub block: Block,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResponse {
    pub address_data: AddressSummary,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
