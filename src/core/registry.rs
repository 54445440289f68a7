//! Account registration
//!
//! Opens an account with the configured starting balance. Credentials are
//! checked by whoever calls this; the ledger only needs the username.

use std::sync::Arc;

use tracing::debug;

use super::catalog::LedgerConfig;
use super::traits::{finish, LedgerStore, UnitOfWork};
use crate::types::{LedgerError, LedgerResult, Username};

/// Creates accounts in a shared store
#[derive(Debug)]
pub struct AccountRegistry<S> {
    store: Arc<S>,
    config: Arc<LedgerConfig>,
}

impl<S> Clone for AccountRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: LedgerStore> AccountRegistry<S> {
    pub fn new(store: Arc<S>, config: Arc<LedgerConfig>) -> Self {
        Self { store, config }
    }

    /// Register `username` with the starting balance
    ///
    /// Fails with `UsernameExists` if the name is taken and with
    /// `InvalidAmount` if the configured starting balance is negative.
    pub async fn register(&self, username: &str) -> LedgerResult<Username> {
        let starting_balance = self.config.starting_balance;
        if starting_balance < 0 {
            return Err(LedgerError::invalid_amount(starting_balance));
        }

        let mut unit = self.store.begin().await?;
        let outcome = unit.create_account(username, starting_balance).await;
        finish(unit, outcome).await?;

        debug!(account = username, amount = starting_balance, "account registered");
        Ok(username.to_string())
    }
}
