pub mod block;
pub mod consensus;
pub mod ledger;
pub mod mempool;
pub mod mining;
pub mod transaction;
pub mod validation;

pub use block::{Block, BlockData};
pub use consensus::{resolve, Resolution};
pub use ledger::{AddressSummary, BlockReceipt, ChainSnapshot, Ledger};
pub use mempool::PendingPool;
pub use transaction::{Transaction, REWARD_SENDER};
pub use validation::{is_valid_block, is_valid_chain};
