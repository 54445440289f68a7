//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account snapshot and scalar aliases
//! - `record`: Immutable transfer and purchase ledger records
//! - `operation`: Shop operations as read from an operation log
//! - `history`: The aggregated per-account history view
//! - `error`: Error types for the ledger

pub mod account;
pub mod error;
pub mod history;
pub mod operation;
pub mod record;

pub use account::{Account, Coins, Quantity, Username};
pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use history::{AccountHistory, CoinHistory, InventoryItem, ReceivedTransfer, SentTransfer};
pub use operation::{Operation, OperationType};
pub use record::{PurchaseRecord, TransferRecord};
