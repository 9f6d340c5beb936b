use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::{Block, BlockData, PendingPool, Transaction};
use crate::error::{Error, Result};

/// A node's view of the ledger, as exchanged during consensus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub pending_transactions: Vec<Transaction>,
}

/// Outcome of offering a peer's block to the local chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReceipt {
    Accepted,
    Rejected,
}

impl BlockReceipt {
    pub fn is_accepted(self) -> bool {
        self == BlockReceipt::Accepted
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressSummary {
    #[serde(rename = "addressBalance")]
    pub balance: f64,
    #[serde(rename = "addressTransactions")]
    pub transactions: Vec<Transaction>,
}

/// The local chain plus the pool of transactions waiting for the next block.
#[derive(Debug, Clone)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: PendingPool,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Ledger {
            chain: vec![Block::genesis()],
            pending: PendingPool::new(),
        }
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        self.pending.transactions()
    }

    pub fn last_block(&self) -> Result<&Block> {
        self.chain.last().ok_or(Error::EmptyChain)
    }

    pub fn create_transaction(
        &self,
        amount: f64,
        sender: String,
        recipient: String,
    ) -> Result<Transaction> {
        Transaction::new(amount, sender, recipient)
    }

    /// Queues `transaction` and returns the index of the block expected to
    /// embed it.
    pub fn add_to_pending_pool(&mut self, transaction: Transaction) -> Result<u64> {
        let next_index = self.last_block()?.index + 1;
        debug!(
            "Queued transaction {} for block #{}",
            transaction.transaction_id, next_index
        );
        self.pending.add_transaction(transaction);
        Ok(next_index)
    }

    /// Content of the block that would be appended next.
    pub fn next_block_data(&self) -> Result<BlockData> {
        Ok(BlockData {
            transactions: self.pending.transactions().to_vec(),
            index: self.last_block()?.index + 1,
        })
    }

    /// Seals the pending pool into a new block. The caller vouches for
    /// `hash` and `nonce`; nothing is re-verified here.
    pub fn append_block(&mut self, nonce: u64, previous_hash: String, hash: String) -> Result<Block> {
        let index = self.last_block()?.index + 1;
        let block = Block::new(index, self.pending.drain(), nonce, previous_hash, hash);

        self.chain.push(block.clone());
        info!(
            "Appended block #{} with {} transactions",
            block.index,
            block.transactions.len()
        );

        Ok(block)
    }

    /// Accepts a peer's block when it links onto the current tip. Only the
    /// linkage is checked; hash and difficulty are left to consensus.
    pub fn receive_block(&mut self, candidate: Block) -> Result<BlockReceipt> {
        let last_block = self.last_block()?;
        let correct_hash = candidate.previous_block_hash == last_block.hash;
        let correct_index = candidate.index == last_block.index + 1;

        if !(correct_hash && correct_index) {
            warn!(
                "Rejected block #{} (tip is #{}, hash linkage {})",
                candidate.index,
                last_block.index,
                if correct_hash { "ok" } else { "broken" }
            );
            return Ok(BlockReceipt::Rejected);
        }

        info!("Accepted block #{} from peer", candidate.index);
        self.chain.push(candidate);
        self.pending.clear();
        Ok(BlockReceipt::Accepted)
    }

    pub fn block_by_hash(&self, hash: &str) -> Option<&Block> {
        self.chain.iter().find(|block| block.hash == hash)
    }

    pub fn transaction_by_id(&self, id: &str) -> Option<(&Transaction, &Block)> {
        self.chain.iter().find_map(|block| {
            block
                .transactions
                .iter()
                .find(|tx| tx.transaction_id == id)
                .map(|tx| (tx, block))
        })
    }

    pub fn address_summary(&self, address: &str) -> AddressSummary {
        let transactions: Vec<Transaction> = self
            .chain
            .iter()
            .flat_map(|block| block.transactions.iter())
            .filter(|tx| tx.touches(address))
            .cloned()
            .collect();

        let balance = transactions.iter().fold(0.0, |balance, tx| {
            let mut balance = balance;
            if tx.recipient == address {
                balance += tx.amount;
            }
            if tx.sender == address {
                balance -= tx.amount;
            }
            balance
        });

        AddressSummary {
            balance,
            transactions,
        }
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            chain: self.chain.clone(),
            pending_transactions: self.pending.transactions().to_vec(),
        }
    }

    /// Adopts a peer's chain and pool wholesale. Callers validate first.
    pub fn replace(&mut self, snapshot: ChainSnapshot) {
        self.chain = snapshot.chain;
        self.pending = PendingPool::from(snapshot.pending_transactions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mining;
    use crate::utils::fingerprint;

    fn transfer(ledger: &mut Ledger, amount: f64, sender: &str, recipient: &str) -> Transaction {
        let tx = ledger
            .create_transaction(amount, sender.into(), recipient.into())
            .unwrap();
        ledger.add_to_pending_pool(tx.clone()).unwrap();
        tx
    }

    fn mine_next(ledger: &mut Ledger) -> Block {
        let previous_hash = ledger.last_block().unwrap().hash.clone();
        let data = ledger.next_block_data().unwrap();
        let nonce = mining::mine(&previous_hash, &data);
        let hash = fingerprint(&previous_hash, &data, nonce);
        ledger.append_block(nonce, previous_hash, hash).unwrap()
    }

    #[test]
    fn starts_with_genesis() {
        let ledger = Ledger::new();
        assert_eq!(ledger.len(), 1);
        assert!(ledger.last_block().unwrap().is_genesis());
        assert!(ledger.pending_transactions().is_empty());
    }

    #[test]
    fn create_transaction_does_not_touch_pool() {
        let ledger = Ledger::new();
        ledger.create_transaction(1.0, "a".into(), "b".into()).unwrap();
        assert!(ledger.pending_transactions().is_empty());
    }

    #[test]
    fn add_to_pending_pool_reports_next_block_index() {
        let mut ledger = Ledger::new();
        let tx = ledger.create_transaction(1.0, "a".into(), "b".into()).unwrap();
        assert_eq!(ledger.add_to_pending_pool(tx).unwrap(), 2);
        assert_eq!(ledger.pending_transactions().len(), 1);
    }

    #[test]
    fn append_block_seals_pool() {
        let mut ledger = Ledger::new();
        let tx = transfer(&mut ledger, 10.0, "a", "b");

        let block = mine_next(&mut ledger);
        assert_eq!(block.index, 2);
        assert_eq!(block.transactions, vec![tx]);
        assert_eq!(block.previous_block_hash, "0");
        assert!(ledger.pending_transactions().is_empty());
        assert_eq!(ledger.last_block().unwrap(), &block);
    }

    fn chain_of_three() -> Ledger {
        let mut ledger = Ledger::new();
        transfer(&mut ledger, 1.0, "a", "b");
        mine_next(&mut ledger);
        transfer(&mut ledger, 2.0, "b", "c");
        mine_next(&mut ledger);
        assert_eq!(ledger.len(), 3);
        ledger
    }

    fn candidate_for(ledger: &Ledger) -> Block {
        let tip = ledger.last_block().unwrap();
        let data = BlockData {
            transactions: Vec::new(),
            index: tip.index + 1,
        };
        let nonce = mining::mine(&tip.hash, &data);
        Block::new(
            data.index,
            Vec::new(),
            nonce,
            tip.hash.clone(),
            fingerprint(&tip.hash, &data, nonce),
        )
    }

    #[test]
    fn receive_block_rejects_index_off_by_one() {
        let mut ledger = chain_of_three();
        transfer(&mut ledger, 3.0, "c", "d");
        let before = ledger.snapshot();

        let mut candidate = candidate_for(&ledger);
        candidate.index += 1;

        assert_eq!(ledger.receive_block(candidate).unwrap(), BlockReceipt::Rejected);
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn receive_block_rejects_wrong_previous_hash() {
        let mut ledger = chain_of_three();
        transfer(&mut ledger, 3.0, "c", "d");
        let before = ledger.snapshot();

        let mut candidate = candidate_for(&ledger);
        candidate.previous_block_hash = ledger.chain()[1].hash.clone();

        assert_eq!(ledger.receive_block(candidate).unwrap(), BlockReceipt::Rejected);
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn receive_block_accepts_linked_candidate_and_clears_pool() {
        let mut ledger = chain_of_three();
        transfer(&mut ledger, 3.0, "c", "d");

        let candidate = candidate_for(&ledger);
        assert_eq!(
            ledger.receive_block(candidate.clone()).unwrap(),
            BlockReceipt::Accepted
        );
        assert_eq!(ledger.len(), 4);
        assert_eq!(ledger.last_block().unwrap(), &candidate);
        assert!(ledger.pending_transactions().is_empty());
    }

    #[test]
    fn receive_block_checks_linkage_only() {
        let mut ledger = Ledger::new();
        let genesis = ledger.last_block().unwrap().clone();
        let unmined = Block::new(2, Vec::new(), 0, genesis.hash, "not-a-hash".into());
        assert!(ledger.receive_block(unmined).unwrap().is_accepted());
    }

    #[test]
    fn lookups_by_hash_and_id() {
        let mut ledger = Ledger::new();
        let tx = transfer(&mut ledger, 4.0, "a", "b");
        let block = mine_next(&mut ledger);

        assert_eq!(ledger.block_by_hash(&block.hash), Some(&block));
        assert!(ledger.block_by_hash("missing").is_none());

        let (found_tx, found_block) = ledger.transaction_by_id(&tx.transaction_id).unwrap();
        assert_eq!(found_tx, &tx);
        assert_eq!(found_block.index, 2);
        assert!(ledger.transaction_by_id("missing").is_none());
    }

    #[test]
    fn pending_transactions_are_not_found_by_id() {
        let mut ledger = Ledger::new();
        let tx = transfer(&mut ledger, 4.0, "a", "b");
        assert!(ledger.transaction_by_id(&tx.transaction_id).is_none());
    }

    #[test]
    fn address_summary_sums_received_minus_sent() {
        let mut ledger = Ledger::new();
        transfer(&mut ledger, 100.0, "Alice", "Bob");
        mine_next(&mut ledger);
        transfer(&mut ledger, 50.0, "Bob", "Charlie");
        transfer(&mut ledger, 30.0, "Charlie", "Alice");
        mine_next(&mut ledger);

        let alice = ledger.address_summary("Alice");
        assert_eq!(alice.balance, -70.0);
        assert_eq!(alice.transactions.len(), 2);
        assert_eq!(alice.transactions[0].recipient, "Bob");
        assert_eq!(alice.transactions[1].sender, "Charlie");

        let bob = ledger.address_summary("Bob");
        assert_eq!(bob.balance, 50.0);

        let nobody = ledger.address_summary("Nobody");
        assert_eq!(nobody.balance, 0.0);
        assert!(nobody.transactions.is_empty());
    }

    #[test]
    fn replace_adopts_chain_and_pool() {
        let source = chain_of_three();
        let mut other = Ledger::new();
        transfer(&mut other, 9.0, "x", "y");

        other.replace(source.snapshot());
        assert_eq!(other.snapshot(), source.snapshot());
    }
}
