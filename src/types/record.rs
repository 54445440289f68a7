//! Ledger record types
//!
//! Transfer and purchase records are immutable facts. They are created only by
//! a successful engine execution, appended to their ledger inside the same unit
//! of work as the balance changes, and never updated or deleted.

use super::account::{Coins, Quantity, Username};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One peer-to-peer coin transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Account the coins left
    pub sender: Username,

    /// Account the coins arrived in
    pub receiver: Username,

    /// Amount moved (> 0)
    pub amount: Coins,

    /// When the transfer was executed
    pub created_at: DateTime<Utc>,
}

impl TransferRecord {
    /// Create a record stamped with the current time
    pub fn new(sender: &str, receiver: &str, amount: Coins) -> Self {
        TransferRecord {
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            amount,
            created_at: Utc::now(),
        }
    }

    /// Whether `account` is on either side of this transfer
    pub fn involves(&self, account: &str) -> bool {
        self.sender == account || self.receiver == account
    }
}

/// One item purchase
///
/// The unit price is snapshotted at purchase time so later catalog changes do
/// not rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Purchasing account
    pub account: Username,

    /// Catalog item name
    pub item: String,

    /// Number of items bought (> 0)
    pub quantity: Quantity,

    /// Catalog price of one item at purchase time
    pub unit_price: Coins,

    /// `unit_price * quantity`
    pub total_price: Coins,

    /// When the purchase was executed
    pub created_at: DateTime<Utc>,
}

impl PurchaseRecord {
    /// Create a record stamped with the current time
    pub fn new(
        account: &str,
        item: &str,
        quantity: Quantity,
        unit_price: Coins,
        total_price: Coins,
    ) -> Self {
        PurchaseRecord {
            account: account.to_string(),
            item: item.to_string(),
            quantity,
            unit_price,
            total_price,
            created_at: Utc::now(),
        }
    }
}
