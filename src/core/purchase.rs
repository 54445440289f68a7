//! Item purchases
//!
//! This module provides the `PurchaseEngine` struct, which spends an account's
//! coins on a catalog item. The unit price is read from the immutable
//! `LedgerConfig` handed over at construction and snapshotted into the
//! purchase record.
//!
//! Validation order: quantity, then catalog lookup, then the total price
//! (checked multiplication), then the balance under the account's row lock.

use std::sync::Arc;

use tracing::debug;

use super::catalog::LedgerConfig;
use super::traits::{finish, LedgerStore, UnitOfWork};
use crate::types::{Coins, LedgerError, LedgerResult, PurchaseRecord, Quantity};

/// Executes purchases against a shared store and a fixed catalog
#[derive(Debug)]
pub struct PurchaseEngine<S> {
    store: Arc<S>,
    config: Arc<LedgerConfig>,
}

impl<S> Clone for PurchaseEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: LedgerStore> PurchaseEngine<S> {
    /// Create a new PurchaseEngine
    ///
    /// # Arguments
    ///
    /// * `store` - Shared store the engine opens units of work on
    /// * `config` - Catalog and starting balance, fixed for the engine's lifetime
    pub fn new(store: Arc<S>, config: Arc<LedgerConfig>) -> Self {
        Self { store, config }
    }

    /// Buy `quantity` units of `item` for `account`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Balance debited by the total price and one purchase record appended
    /// * `Err(LedgerError::InvalidAmount)` - `quantity <= 0`
    /// * `Err(LedgerError::ItemNotFound)` - Item not in the catalog
    /// * `Err(LedgerError::ArithmeticOverflow)` - `unit_price * quantity` overflows
    /// * `Err(LedgerError::AccountNotFound)` - Purchaser missing
    /// * `Err(LedgerError::InsufficientBalance)` - Balance below the total price
    /// * `Err(LedgerError::StorageFailure)` - Store failed; nothing was applied
    pub async fn purchase(
        &self,
        account: &str,
        item: &str,
        quantity: Quantity,
    ) -> LedgerResult<()> {
        if quantity <= 0 {
            return Err(LedgerError::invalid_amount(quantity));
        }

        let unit_price = self
            .config
            .catalog
            .price(item)
            .ok_or_else(|| LedgerError::item_not_found(item))?;
        let total_price = unit_price
            .checked_mul(quantity)
            .ok_or_else(|| LedgerError::arithmetic_overflow("purchase", account))?;

        let mut unit = self.store.begin().await?;
        let record = PurchaseRecord::new(account, item, quantity, unit_price, total_price);
        let outcome = Self::apply(&mut unit, record).await;
        finish(unit, outcome).await?;

        debug!(account, item, quantity, amount = total_price, "purchase committed");
        Ok(())
    }

    async fn apply(unit: &mut S::Unit, record: PurchaseRecord) -> LedgerResult<()> {
        let balance: Coins = unit.get_balance(&record.account).await?;
        if balance < record.total_price {
            return Err(LedgerError::insufficient_balance(
                &record.account,
                balance,
                record.total_price,
            ));
        }

        unit.debit(&record.account, record.total_price).await?;
        unit.append_purchase(record).await
    }
}
