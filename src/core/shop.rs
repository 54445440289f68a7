//! Shop facade
//!
//! This module provides the `Shop` struct, which wires the engines to one
//! shared store and one configuration, and dispatches [`Operation`]s to them.
//!
//! # Architecture
//!
//! ```text
//! Shop
//!     ├── AccountRegistry   (register)
//!     ├── TransferEngine    (transfer)
//!     ├── PurchaseEngine    (buy)
//!     └── HistoryAssembler  (read-only views)
//!            all sharing Arc<S: LedgerStore> + Arc<LedgerConfig>
//! ```
//!
//! # Thread Safety
//!
//! Cloning a `Shop` clones `Arc`s only. Clones may run operations concurrently;
//! the store serializes whatever touches the same account.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{error, warn};

use super::catalog::LedgerConfig;
use super::history::HistoryAssembler;
use super::purchase::PurchaseEngine;
use super::registry::AccountRegistry;
use super::traits::LedgerStore;
use super::transfer::TransferEngine;
use crate::types::{
    Account, AccountHistory, Coins, LedgerError, LedgerResult, Operation, Quantity, Username,
};

/// All ledger operations behind one handle
#[derive(Debug)]
pub struct Shop<S> {
    store: Arc<S>,
    registry: AccountRegistry<S>,
    transfers: TransferEngine<S>,
    purchases: PurchaseEngine<S>,
    history: HistoryAssembler<S>,
}

impl<S> Clone for Shop<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            registry: self.registry.clone(),
            transfers: self.transfers.clone(),
            purchases: self.purchases.clone(),
            history: self.history.clone(),
        }
    }
}

impl<S: LedgerStore> Shop<S> {
    /// Create a new Shop
    ///
    /// # Arguments
    ///
    /// * `store` - Store shared by every engine
    /// * `config` - Catalog and starting balance
    pub fn new(store: Arc<S>, config: Arc<LedgerConfig>) -> Self {
        Self {
            registry: AccountRegistry::new(Arc::clone(&store), Arc::clone(&config)),
            transfers: TransferEngine::new(Arc::clone(&store)),
            purchases: PurchaseEngine::new(Arc::clone(&store), config),
            history: HistoryAssembler::new(Arc::clone(&store)),
            store,
        }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run one operation
    pub async fn execute(&self, operation: &Operation) -> LedgerResult<()> {
        match operation {
            Operation::Register { username } => self.register(username).await.map(|_| ()),
            Operation::Transfer { from, to, amount } => self.transfer(from, to, *amount).await,
            Operation::Buy {
                account,
                item,
                quantity,
            } => self.purchase(account, item, *quantity).await,
        }
    }

    pub async fn register(&self, username: &str) -> LedgerResult<Username> {
        self.registry.register(username).await
    }

    pub async fn transfer(&self, from: &str, to: &str, amount: Coins) -> LedgerResult<()> {
        self.transfers.transfer(from, to, amount).await
    }

    pub async fn purchase(
        &self,
        account: &str,
        item: &str,
        quantity: Quantity,
    ) -> LedgerResult<()> {
        self.purchases.purchase(account, item, quantity).await
    }

    pub async fn history(&self, account: &str) -> LedgerResult<AccountHistory> {
        self.history.history(account).await
    }

    /// All accounts, sorted by username
    pub async fn balances(&self) -> LedgerResult<Vec<Account>> {
        let mut accounts = self.store.accounts().await?;
        accounts.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(accounts)
    }

    /// History of every account, keyed by username
    pub async fn histories(&self) -> LedgerResult<BTreeMap<Username, AccountHistory>> {
        let mut histories = BTreeMap::new();
        for account in self.store.accounts().await? {
            let history = self.history(&account.username).await?;
            histories.insert(account.username, history);
        }
        Ok(histories)
    }
}

/// Log an operation the ledger refused
///
/// Business-rule rejections are expected during replay and logged at warn;
/// storage failures at error.
pub fn log_rejection(operation: &Operation, err: &LedgerError) {
    let kind = err.kind().as_str();
    let op = operation.op_type();
    let actor = operation.actor();
    if err.is_business_rule() {
        warn!(?op, account = actor, kind, "operation rejected: {}", err);
    } else {
        error!(?op, account = actor, kind, "operation failed: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::Catalog;
    use crate::store::InMemoryLedgerStore;

    fn shop() -> Shop<InMemoryLedgerStore> {
        Shop::new(
            Arc::new(InMemoryLedgerStore::new()),
            Arc::new(LedgerConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_execute_dispatches_each_operation() {
        let shop = shop();

        for op in [
            Operation::Register {
                username: "alice".into(),
            },
            Operation::Register {
                username: "bob".into(),
            },
            Operation::Transfer {
                from: "alice".into(),
                to: "bob".into(),
                amount: 100,
            },
            Operation::Buy {
                account: "bob".into(),
                item: "cup".into(),
                quantity: 2,
            },
        ] {
            shop.execute(&op).await.unwrap();
        }

        let balances = shop.balances().await.unwrap();
        assert_eq!(
            balances,
            vec![Account::new("alice", 900), Account::new("bob", 1060)]
        );
    }

    #[tokio::test]
    async fn test_execute_propagates_rejections() {
        let shop = shop();
        shop.register("alice").await.unwrap();

        let yacht = Operation::Buy {
            account: "alice".into(),
            item: "yacht".into(),
            quantity: 1,
        };
        let err = shop.execute(&yacht).await.unwrap_err();

        assert_eq!(err, LedgerError::item_not_found("yacht"));
    }

    #[tokio::test]
    async fn test_histories_cover_every_account() {
        let shop = Shop::new(
            Arc::new(InMemoryLedgerStore::new()),
            Arc::new(LedgerConfig::new(Catalog::standard(), 50)),
        );
        shop.register("bob").await.unwrap();
        shop.register("alice").await.unwrap();
        shop.transfer("bob", "alice", 20).await.unwrap();

        let histories = shop.histories().await.unwrap();

        let names: Vec<&str> = histories.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["alice", "bob"]);
        assert_eq!(histories["alice"].coins, 70);
        assert_eq!(histories["bob"].coin_history.sent.len(), 1);
    }
}
