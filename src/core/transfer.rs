//! Peer-to-peer coin transfers
//!
//! This module provides the `TransferEngine` struct, which validates and
//! executes a transfer between two accounts as one unit of work.
//!
//! # Design
//!
//! Validation runs in a fixed order and the first failing check wins:
//!
//! 1. Sender equals receiver → `InvalidRecipient`
//! 2. Amount not positive → `InvalidAmount`
//! 3. Sender balance, read under its row lock → `AccountNotFound` / `InsufficientBalance`
//! 4. Receiver existence → `AccountNotFound`
//!
//! The first two checks need no store access. Both row locks are taken before
//! step 3, in username order, so two transfers crossing between the same pair
//! of accounts cannot deadlock. An account whose row was not locked at that
//! point is reported missing, even if it has been registered since; locking
//! it late would break the order.
//!
//! # Architecture
//!
//! ```text
//! TransferEngine
//!     └── Arc<S: LedgerStore>
//!             └── UnitOfWork: lock → validate → debit → credit → append → commit
//! ```

use std::sync::Arc;

use tracing::debug;

use super::traits::{finish, LedgerStore, UnitOfWork};
use crate::types::{Coins, LedgerError, LedgerResult, TransferRecord};

/// Executes transfers against a shared store
#[derive(Debug)]
pub struct TransferEngine<S> {
    store: Arc<S>,
}

impl<S> Clone for TransferEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> TransferEngine<S> {
    /// Create a new TransferEngine
    ///
    /// # Arguments
    ///
    /// * `store` - Shared store the engine opens units of work on
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Move `amount` coins from `from` to `to`
    ///
    /// # Arguments
    ///
    /// * `from` - Acting account, already resolved by the caller
    /// * `to` - Receiving account
    /// * `amount` - Number of coins to move
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Both balances changed and one transfer record was appended
    /// * `Err(LedgerError::InvalidRecipient)` - `from == to`
    /// * `Err(LedgerError::InvalidAmount)` - `amount <= 0`
    /// * `Err(LedgerError::AccountNotFound)` - Sender or receiver missing
    /// * `Err(LedgerError::InsufficientBalance)` - Sender balance below `amount`
    /// * `Err(LedgerError::StorageFailure)` - Store failed; nothing was applied
    pub async fn transfer(&self, from: &str, to: &str, amount: Coins) -> LedgerResult<()> {
        if from == to {
            return Err(LedgerError::invalid_recipient(from));
        }
        if amount <= 0 {
            return Err(LedgerError::invalid_amount(amount));
        }

        let mut unit = self.store.begin().await?;
        let outcome = Self::apply(&mut unit, from, to, amount).await;
        finish(unit, outcome).await?;

        debug!(from, to, amount, "transfer committed");
        Ok(())
    }

    async fn apply(unit: &mut S::Unit, from: &str, to: &str, amount: Coins) -> LedgerResult<()> {
        let held = unit.lock_accounts(&[from, to]).await?;
        let is_held = |account: &str| held.iter().any(|name| name == account);

        if !is_held(from) {
            return Err(LedgerError::account_not_found(from));
        }
        let balance = unit.get_balance(from).await?;
        if balance < amount {
            return Err(LedgerError::insufficient_balance(from, balance, amount));
        }

        // A receiver registered after the locks were taken counts as missing,
        // and so does a failed existence check
        match unit.account_exists(to).await {
            Ok(true) if is_held(to) => {}
            _ => return Err(LedgerError::account_not_found(to)),
        }

        unit.debit(from, amount).await?;
        unit.credit(to, amount).await?;

        let record = TransferRecord::new(from, to, amount);
        unit.append_transfer(record).await
    }
}
