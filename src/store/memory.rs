//! In-memory ledger store with row-level locking
//!
//! This module provides `InMemoryLedgerStore`, the default persistence
//! collaborator. It keeps balances in a `DashMap` of per-account async mutexes
//! and the two ledgers in append-only vectors.
//!
//! # Design
//!
//! A unit of work acquires owned guards on the balance rows it touches and
//! holds them until it commits or is dropped. All writes (balance changes,
//! ledger appends, new accounts) are staged inside the unit and applied in
//! `commit`, which has no suspension point: a cancelled operation has either
//! applied everything or nothing.
//!
//! ```text
//! InMemoryLedgerStore
//!     └── Arc<Shared>
//!         ├── DashMap<Username, Arc<Mutex<Coins>>>  (balance rows)
//!         ├── RwLock<Vec<TransferRecord>>           (transfer ledger)
//!         ├── RwLock<Vec<PurchaseRecord>>           (purchase ledger)
//!         └── Mutex<HashSet<FaultPoint>>            (one-shot injected faults)
//! ```
//!
//! # Thread Safety
//!
//! Units touching different accounts proceed in parallel. Units touching the
//! same account are serialized by that account's row lock, which closes the
//! check-then-debit race between concurrent drains of one balance.

use crate::core::traits::{LedgerStore, UnitOfWork};
use crate::types::{
    Account, Coins, LedgerError, LedgerResult, PurchaseRecord, TransferRecord, Username,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Store step that can be made to fail on purpose
///
/// Faults are one-shot: the next time the step runs it fails with
/// `StorageFailure` and the fault is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    Begin,
    Lock,
    AccountExists,
    Debit,
    Credit,
    AppendTransfer,
    AppendPurchase,
    CreateAccount,
    Commit,
}

type BalanceRow = Arc<Mutex<Coins>>;

#[derive(Debug, Default)]
struct Shared {
    balances: DashMap<Username, BalanceRow>,
    transfers: RwLock<Vec<TransferRecord>>,
    purchases: RwLock<Vec<PurchaseRecord>>,
    faults: StdMutex<HashSet<FaultPoint>>,
}

impl Shared {
    /// Fail if a fault is armed for `point`, disarming it
    fn trip(&self, point: FaultPoint) -> LedgerResult<()> {
        let mut faults = self
            .faults
            .lock()
            .map_err(|_| LedgerError::storage("fault registry lock poisoned"))?;
        if faults.remove(&point) {
            return Err(LedgerError::storage(format!(
                "injected fault at {:?}",
                point
            )));
        }
        Ok(())
    }

    /// Handle to an account's balance row
    ///
    /// The map reference is released before returning so it is never held
    /// across an await.
    fn row(&self, account: &str) -> Option<BalanceRow> {
        self.balances
            .get(account)
            .map(|entry| Arc::clone(entry.value()))
    }
}

/// Thread-safe in-memory implementation of [`LedgerStore`]
///
/// Cloning is cheap and every clone shares the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    shared: Arc<Shared>,
}

impl InMemoryLedgerStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with accounts
    ///
    /// Bypasses registration; negative balances are clamped to zero.
    pub fn with_accounts<I, S>(accounts: I) -> Self
    where
        I: IntoIterator<Item = (S, Coins)>,
        S: Into<Username>,
    {
        let store = Self::new();
        for (username, coins) in accounts {
            store
                .shared
                .balances
                .insert(username.into(), Arc::new(Mutex::new(coins.max(0))));
        }
        store
    }

    /// Arm a one-shot fault
    pub fn inject_fault(&self, point: FaultPoint) {
        if let Ok(mut faults) = self.shared.faults.lock() {
            faults.insert(point);
        }
    }

    /// Number of records in the transfer ledger
    pub fn transfer_count(&self) -> usize {
        self.shared.transfers.read().map(|t| t.len()).unwrap_or(0)
    }

    /// Number of records in the purchase ledger
    pub fn purchase_count(&self) -> usize {
        self.shared.purchases.read().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    type Unit = InMemoryUnit;

    async fn begin(&self) -> LedgerResult<InMemoryUnit> {
        self.shared.trip(FaultPoint::Begin)?;
        Ok(InMemoryUnit {
            shared: Arc::clone(&self.shared),
            locked: BTreeMap::new(),
            staged: HashMap::new(),
            new_accounts: Vec::new(),
            transfers: Vec::new(),
            purchases: Vec::new(),
        })
    }

    async fn balance(&self, account: &str) -> LedgerResult<Coins> {
        let row = self
            .shared
            .row(account)
            .ok_or_else(|| LedgerError::account_not_found(account))?;
        let coins = *row.lock().await;
        Ok(coins)
    }

    async fn purchases_of(&self, account: &str) -> LedgerResult<Vec<PurchaseRecord>> {
        let purchases = self
            .shared
            .purchases
            .read()
            .map_err(|_| LedgerError::storage("purchase ledger lock poisoned"))?;
        Ok(purchases
            .iter()
            .filter(|record| record.account == account)
            .cloned()
            .collect())
    }

    async fn transfers_of(&self, account: &str) -> LedgerResult<Vec<TransferRecord>> {
        let transfers = self
            .shared
            .transfers
            .read()
            .map_err(|_| LedgerError::storage("transfer ledger lock poisoned"))?;
        Ok(transfers
            .iter()
            .filter(|record| record.involves(account))
            .cloned()
            .collect())
    }

    async fn accounts(&self) -> LedgerResult<Vec<Account>> {
        let rows: Vec<(Username, BalanceRow)> = self
            .shared
            .balances
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut accounts = Vec::with_capacity(rows.len());
        for (username, row) in rows {
            let coins = *row.lock().await;
            accounts.push(Account::new(username, coins));
        }
        Ok(accounts)
    }
}

/// Unit of work over an [`InMemoryLedgerStore`]
///
/// Holds the row guards it acquired and every staged write. Dropping it
/// releases the guards and discards the writes.
pub struct InMemoryUnit {
    shared: Arc<Shared>,
    locked: BTreeMap<Username, OwnedMutexGuard<Coins>>,
    staged: HashMap<Username, Coins>,
    new_accounts: Vec<(Username, Coins)>,
    transfers: Vec<TransferRecord>,
    purchases: Vec<PurchaseRecord>,
}

impl InMemoryUnit {
    fn is_new(&self, account: &str) -> bool {
        self.new_accounts.iter().any(|(name, _)| name == account)
    }

    /// Balance as this unit sees it: staged value, else locked row, else new account
    fn current(&self, account: &str) -> Option<Coins> {
        if let Some(coins) = self.staged.get(account) {
            return Some(*coins);
        }
        if let Some(guard) = self.locked.get(account) {
            return Some(**guard);
        }
        self.new_accounts
            .iter()
            .find(|(name, _)| name == account)
            .map(|(_, coins)| *coins)
    }

    /// Apply every staged write to shared state
    ///
    /// Synchronous on purpose: nothing in here can be interrupted by a
    /// cancelled future.
    fn apply(mut self) -> LedgerResult<()> {
        let shared = Arc::clone(&self.shared);

        let mut transfers = shared
            .transfers
            .write()
            .map_err(|_| LedgerError::storage("transfer ledger lock poisoned"))?;
        let mut purchases = shared
            .purchases
            .write()
            .map_err(|_| LedgerError::storage("purchase ledger lock poisoned"))?;

        // New accounts first: a lost registration race must fail before anything is applied
        let mut created: Vec<&str> = Vec::new();
        for (username, opening) in &self.new_accounts {
            let coins = self.staged.get(username).copied().unwrap_or(*opening);
            let mut inserted = false;
            shared.balances.entry(username.clone()).or_insert_with(|| {
                inserted = true;
                Arc::new(Mutex::new(coins))
            });
            if !inserted {
                for done in created {
                    shared.balances.remove(done);
                }
                return Err(LedgerError::username_exists(username));
            }
            created.push(username);
        }

        for (username, guard) in self.locked.iter_mut() {
            if let Some(coins) = self.staged.get(username) {
                **guard = *coins;
            }
        }

        transfers.append(&mut self.transfers);
        purchases.append(&mut self.purchases);

        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnit {
    async fn lock_accounts(&mut self, accounts: &[&str]) -> LedgerResult<Vec<Username>> {
        self.shared.trip(FaultPoint::Lock)?;

        let mut ordered: Vec<&str> = accounts.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let mut held = Vec::with_capacity(ordered.len());
        for account in ordered {
            if self.locked.contains_key(account) {
                held.push(account.to_string());
                continue;
            }
            let Some(row) = self.shared.row(account) else {
                continue;
            };
            // Waiting on a row that sorts before one already held can deadlock
            if let Some((last, _)) = self.locked.last_key_value() {
                if last.as_str() > account {
                    return Err(LedgerError::storage(format!(
                        "row lock on '{}' requested after '{}'",
                        account, last
                    )));
                }
            }
            let guard = row.lock_owned().await;
            self.locked.insert(account.to_string(), guard);
            held.push(account.to_string());
        }
        Ok(held)
    }

    async fn get_balance(&mut self, account: &str) -> LedgerResult<Coins> {
        if !self.locked.contains_key(account) && !self.is_new(account) {
            self.lock_accounts(&[account]).await?;
        }
        self.current(account)
            .ok_or_else(|| LedgerError::account_not_found(account))
    }

    async fn account_exists(&mut self, account: &str) -> LedgerResult<bool> {
        self.shared.trip(FaultPoint::AccountExists)?;
        Ok(self.is_new(account) || self.shared.balances.contains_key(account))
    }

    async fn credit(&mut self, account: &str, amount: Coins) -> LedgerResult<()> {
        if amount <= 0 {
            return Err(LedgerError::invalid_amount(amount));
        }
        self.shared.trip(FaultPoint::Credit)?;

        let balance = self.get_balance(account).await?;
        let updated = balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("credit", account))?;
        self.staged.insert(account.to_string(), updated);
        Ok(())
    }

    async fn debit(&mut self, account: &str, amount: Coins) -> LedgerResult<()> {
        if amount <= 0 {
            return Err(LedgerError::invalid_amount(amount));
        }
        self.shared.trip(FaultPoint::Debit)?;

        let balance = self.get_balance(account).await?;
        if balance < amount {
            return Err(LedgerError::insufficient_balance(account, balance, amount));
        }
        self.staged.insert(account.to_string(), balance - amount);
        Ok(())
    }

    async fn append_transfer(&mut self, record: TransferRecord) -> LedgerResult<()> {
        self.shared.trip(FaultPoint::AppendTransfer)?;
        self.transfers.push(record);
        Ok(())
    }

    async fn append_purchase(&mut self, record: PurchaseRecord) -> LedgerResult<()> {
        self.shared.trip(FaultPoint::AppendPurchase)?;
        self.purchases.push(record);
        Ok(())
    }

    async fn create_account(&mut self, account: &str, balance: Coins) -> LedgerResult<()> {
        self.shared.trip(FaultPoint::CreateAccount)?;
        if balance < 0 {
            return Err(LedgerError::invalid_amount(balance));
        }
        if self.is_new(account) || self.shared.balances.contains_key(account) {
            return Err(LedgerError::username_exists(account));
        }
        self.new_accounts.push((account.to_string(), balance));
        Ok(())
    }

    async fn commit(self) -> LedgerResult<()> {
        self.shared.trip(FaultPoint::Commit)?;
        self.apply()
    }

    async fn rollback(self) -> LedgerResult<()> {
        drop(self);
        Ok(())
    }
}
