use serde::{Deserialize, Serialize};
use uuid;

use crate::error::{Error, Result};

/// Sender reserved for coins issued as a mining reward.
pub const REWARD_SENDER: &str = "00";

// Field order is part of the block fingerprint preimage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub amount: f64,
    pub sender: String,
    pub recipient: String,
    pub transaction_id: String,
}

impl Transaction {
    pub fn new(amount: f64, sender: String, recipient: String) -> Result<Self> {
        let transaction = Self {
            amount,
            sender,
            recipient,
            transaction_id: new_id(),
        };
        transaction.validate()?;
        Ok(transaction)
    }

    /// Amounts must be finite and non-negative, wherever the transaction
    /// was created.
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(Error::Validation(format!(
                "amount must be a non-negative number, got {}",
                self.amount
            )));
        }
        Ok(())
    }

    pub fn reward(amount: f64, recipient: String) -> Result<Self> {
        Self::new(amount, REWARD_SENDER.to_string(), recipient)
    }

    pub fn touches(&self, address: &str) -> bool {
        self.sender == address || self.recipient == address
    }
}

/// 32 lowercase hex characters.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
