use super::Transaction;

/// Transactions accepted by this node but not yet embedded in a local block.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PendingPool {
    transactions: Vec<Transaction>,
}

impl PendingPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_transaction(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Empties the pool, handing back what it held in arrival order.
    pub fn drain(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.transactions)
    }

    pub fn clear(&mut self) {
        self.transactions.clear();
    }

    pub fn pending_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

impl From<Vec<Transaction>> for PendingPool {
    fn from(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }
}
