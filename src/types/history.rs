//! Account history view
//!
//! The read model assembled by the history assembler: current balance, items
//! bought (quantities summed per item), and coin transfers split into received
//! and sent. Serializes to the shape the shop's info endpoint returns:
//!
//! ```json
//! {
//!   "coins": 900,
//!   "inventory": [{ "item": "cup", "quantity": 2 }],
//!   "coinHistory": {
//!     "received": [{ "fromUser": "bob", "amount": 40 }],
//!     "sent": [{ "toUser": "carol", "amount": 100 }]
//!   }
//! }
//! ```

use super::account::{Coins, Quantity, Username};
use serde::Serialize;

/// Aggregated history of one account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountHistory {
    /// Current balance
    pub coins: Coins,

    /// Items bought, one entry per distinct item
    pub inventory: Vec<InventoryItem>,

    /// Transfers in both directions
    pub coin_history: CoinHistory,
}

/// Summed purchase quantity for one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryItem {
    pub item: String,
    pub quantity: Quantity,
}

/// Transfers involving the account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoinHistory {
    /// Transfers where the account is the receiver
    pub received: Vec<ReceivedTransfer>,

    /// Transfers where the account is the sender
    pub sent: Vec<SentTransfer>,
}

/// Incoming transfer, seen from the receiver
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedTransfer {
    pub from_user: Username,
    pub amount: Coins,
}

/// Outgoing transfer, seen from the sender
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentTransfer {
    pub to_user: Username,
    pub amount: Coins,
}
