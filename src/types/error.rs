//! Error types for the coin ledger
//!
//! This module defines every way a ledger operation can fail. The variants map
//! one-to-one onto the kinds a boundary layer needs to translate into a precise
//! response, and each carries enough context to log a useful message.
//!
//! # Error Categories
//!
//! - **Validation Errors**: invalid amount, invalid recipient. Detected before any
//!   store access and never retried.
//! - **Lookup Errors**: unknown account, unknown catalog item, taken username.
//! - **Balance Errors**: insufficient balance, either at validation time or reported
//!   by the store when a concurrent debit won the row lock first.
//! - **Arithmetic Errors**: overflow in price or balance calculations.
//! - **Storage Errors**: the persistence collaborator failed for reasons unrelated to
//!   business rules. Surfaced opaquely; the whole operation may be retried.

use crate::types::Coins;
use thiserror::Error;

/// Convenience alias used throughout the core and store layers
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Bare error kind, stripped of context
///
/// Boundary layers (HTTP handlers, replay reports) match on this rather than on
/// the full error so they don't need to care about the context fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidAmount,
    InvalidRecipient,
    AccountNotFound,
    ItemNotFound,
    InsufficientBalance,
    UsernameExists,
    ArithmeticOverflow,
    StorageFailure,
}

impl ErrorKind {
    /// Stable snake_case name, used as a structured log field
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidAmount => "invalid_amount",
            ErrorKind::InvalidRecipient => "invalid_recipient",
            ErrorKind::AccountNotFound => "account_not_found",
            ErrorKind::ItemNotFound => "item_not_found",
            ErrorKind::InsufficientBalance => "insufficient_balance",
            ErrorKind::UsernameExists => "username_exists",
            ErrorKind::ArithmeticOverflow => "arithmetic_overflow",
            ErrorKind::StorageFailure => "storage_failure",
        }
    }
}

/// Main error type for the coin ledger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Amount or quantity is zero or negative
    #[error("Invalid amount {amount}: must be greater than zero")]
    InvalidAmount {
        /// The rejected amount or quantity
        amount: i64,
    },

    /// Sender and receiver of a transfer are the same account
    #[error("Invalid recipient: {account} cannot transfer coins to itself")]
    InvalidRecipient {
        /// The account that tried to pay itself
        account: String,
    },

    /// Referenced account (sender, receiver or purchaser) does not exist
    #[error("Account '{account}' not found")]
    AccountNotFound {
        /// Username that was looked up
        account: String,
    },

    /// Catalog has no item with this name
    #[error("Item '{item}' not found in catalog")]
    ItemNotFound {
        /// Requested item name
        item: String,
    },

    /// Balance is lower than the amount required
    ///
    /// Raised by the engines at validation time and by the store itself when a
    /// debit would take the balance below zero.
    #[error("Insufficient balance for {account}: balance {balance}, requested {requested}")]
    InsufficientBalance {
        /// Account being debited
        account: String,
        /// Balance observed under the row lock
        balance: Coins,
        /// Amount the operation needed
        requested: Coins,
    },

    /// Registration conflict
    #[error("Username '{username}' already exists")]
    UsernameExists {
        /// The username that is already taken
        username: String,
    },

    /// Checked arithmetic failed
    #[error("Arithmetic overflow in {operation} for {account}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account involved
        account: String,
    },

    /// Persistence collaborator failed
    #[error("Storage failure: {message}")]
    StorageFailure {
        /// Description of the underlying failure
        message: String,
    },
}

impl LedgerError {
    /// The bare kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            LedgerError::InvalidRecipient { .. } => ErrorKind::InvalidRecipient,
            LedgerError::AccountNotFound { .. } => ErrorKind::AccountNotFound,
            LedgerError::ItemNotFound { .. } => ErrorKind::ItemNotFound,
            LedgerError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            LedgerError::UsernameExists { .. } => ErrorKind::UsernameExists,
            LedgerError::ArithmeticOverflow { .. } => ErrorKind::ArithmeticOverflow,
            LedgerError::StorageFailure { .. } => ErrorKind::StorageFailure,
        }
    }

    /// Whether this error is a business-rule rejection rather than a store failure
    pub fn is_business_rule(&self) -> bool {
        !matches!(self, LedgerError::StorageFailure { .. })
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: i64) -> Self {
        LedgerError::InvalidAmount { amount }
    }

    /// Create an InvalidRecipient error
    pub fn invalid_recipient(account: &str) -> Self {
        LedgerError::InvalidRecipient {
            account: account.to_string(),
        }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(account: &str) -> Self {
        LedgerError::AccountNotFound {
            account: account.to_string(),
        }
    }

    /// Create an ItemNotFound error
    pub fn item_not_found(item: &str) -> Self {
        LedgerError::ItemNotFound {
            item: item.to_string(),
        }
    }

    /// Create an InsufficientBalance error
    pub fn insufficient_balance(account: &str, balance: Coins, requested: Coins) -> Self {
        LedgerError::InsufficientBalance {
            account: account.to_string(),
            balance,
            requested,
        }
    }

    /// Create a UsernameExists error
    pub fn username_exists(username: &str) -> Self {
        LedgerError::UsernameExists {
            username: username.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: &str) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account: account.to_string(),
        }
    }

    /// Create a StorageFailure error
    pub fn storage(message: impl Into<String>) -> Self {
        LedgerError::StorageFailure {
            message: message.into(),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for LedgerError {
    fn from(error: sqlx::Error) -> Self {
        LedgerError::storage(error.to_string())
    }
}
