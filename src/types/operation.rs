//! Operation types for the coin ledger
//!
//! An `Operation` is one request against the shop, already resolved to the
//! acting account by whoever authenticated it. The replay surface reads these
//! from a CSV operation log.

use super::account::{Coins, Quantity, Username};

/// Operation names supported by the shop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    /// Open a new account with the configured starting balance
    Register,

    /// Move coins from the acting account to another account
    Transfer,

    /// Spend coins from the acting account on a catalog item
    Buy,
}

/// One shop operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Register {
        username: Username,
    },
    Transfer {
        from: Username,
        to: Username,
        amount: Coins,
    },
    Buy {
        account: Username,
        item: String,
        quantity: Quantity,
    },
}

impl Operation {
    /// The account performing the operation
    ///
    /// Used to partition work so each actor's operations keep their order.
    pub fn actor(&self) -> &str {
        match self {
            Operation::Register { username } => username,
            Operation::Transfer { from, .. } => from,
            Operation::Buy { account, .. } => account,
        }
    }

    /// The operation name
    pub fn op_type(&self) -> OperationType {
        match self {
            Operation::Register { .. } => OperationType::Register,
            Operation::Transfer { .. } => OperationType::Transfer,
            Operation::Buy { .. } => OperationType::Buy,
        }
    }
}
