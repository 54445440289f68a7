//! Account-related types for the coin ledger
//!
//! This module defines the Account snapshot returned by the store and the
//! scalar aliases shared by every layer.

use serde::Serialize;

/// Account identifier: the unique username
pub type Username = String;

/// Coin amount
///
/// Signed so that invalid (zero or negative) inputs can be represented and
/// rejected explicitly; stored balances are never negative.
pub type Coins = i64;

/// Item quantity in a purchase
pub type Quantity = i64;

/// Committed account state
///
/// A point-in-time snapshot read from the store. Mutations never go through
/// this type; they go through a unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    /// The unique username
    pub username: Username,

    /// Current coin balance (always >= 0)
    pub coins: Coins,
}

impl Account {
    /// Create an account snapshot
    pub fn new(username: impl Into<Username>, coins: Coins) -> Self {
        Account {
            username: username.into(),
            coins,
        }
    }
}
