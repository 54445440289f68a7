//! Core traits for the persistence collaborator
//!
//! This module defines the trait abstractions the engines drive. Any store
//! technology that can serialize read-then-write access to a balance row (a
//! pessimistic row lock, or an optimistic compare-and-swap that retries) can
//! implement them.
//!
//! # Unit of Work
//!
//! Every mutation happens inside a [`UnitOfWork`] opened with
//! [`LedgerStore::begin`]. The engines drive it explicitly:
//!
//! ```text
//! begin ─► lock_accounts ─► get_balance / account_exists (validate)
//!       ─► debit / credit / append_*                    (stage)
//!       ─► commit                                       (all visible)
//!        └► rollback or drop                            (nothing visible)
//! ```
//!
//! Dropping a unit without committing it is a rollback. This is what keeps a
//! cancelled operation atomic: whoever drops the future that owns the unit
//! also drops the unit.

use crate::types::{Account, Coins, LedgerResult, PurchaseRecord, TransferRecord, Username};
use async_trait::async_trait;

/// Store of balances and append-only ledgers
///
/// Reads on this trait observe committed state only and take no row locks;
/// they are used by the history assembler and reporting.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// The unit of work type this store hands out
    type Unit: UnitOfWork + 'static;

    /// Open a new atomic unit of work
    async fn begin(&self) -> LedgerResult<Self::Unit>;

    /// Committed balance of an account
    ///
    /// Fails with `AccountNotFound` if the account does not exist.
    async fn balance(&self, account: &str) -> LedgerResult<Coins>;

    /// Purchase records of an account, in ledger insertion order
    async fn purchases_of(&self, account: &str) -> LedgerResult<Vec<PurchaseRecord>>;

    /// Transfer records where the account is sender or receiver, in ledger insertion order
    async fn transfers_of(&self, account: &str) -> LedgerResult<Vec<TransferRecord>>;

    /// Snapshot of all accounts, in no particular order
    async fn accounts(&self) -> LedgerResult<Vec<Account>>;
}

/// One atomic unit of work against a [`LedgerStore`]
///
/// Balance reads inside a unit are made under a row lock that is held until
/// the unit commits or rolls back, so two units touching the same account are
/// serialized.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Lock the balance rows of all given accounts
    ///
    /// Locks are taken in lexicographic username order regardless of argument
    /// order, so two units locking overlapping sets cannot deadlock. Accounts
    /// that don't exist are skipped; existence is checked separately.
    ///
    /// Returns the requested accounts whose rows this unit now holds, in lock
    /// order. An account created after this call is not among them and must
    /// be treated as absent for the rest of the unit.
    async fn lock_accounts(&mut self, accounts: &[&str]) -> LedgerResult<Vec<Username>>;

    /// Balance of an account as seen by this unit, read under a row lock
    ///
    /// A row not locked yet is locked here. Stores may refuse to do that when
    /// it would break username lock order.
    async fn get_balance(&mut self, account: &str) -> LedgerResult<Coins>;

    /// Whether an account exists (no lock taken)
    async fn account_exists(&mut self, account: &str) -> LedgerResult<bool>;

    /// Increase a balance. `amount` must be positive.
    async fn credit(&mut self, account: &str, amount: Coins) -> LedgerResult<()>;

    /// Decrease a balance. `amount` must be positive.
    ///
    /// Must fail with `InsufficientBalance` rather than take the balance below zero.
    async fn debit(&mut self, account: &str, amount: Coins) -> LedgerResult<()>;

    /// Append to the transfer ledger
    async fn append_transfer(&mut self, record: TransferRecord) -> LedgerResult<()>;

    /// Append to the purchase ledger
    async fn append_purchase(&mut self, record: PurchaseRecord) -> LedgerResult<()>;

    /// Create an account with an opening balance
    ///
    /// Fails with `UsernameExists` if the username is taken, either when staged
    /// or, for a concurrent registration, at commit.
    async fn create_account(&mut self, account: &str, balance: Coins) -> LedgerResult<()>;

    /// Make every staged effect visible at once
    async fn commit(self) -> LedgerResult<()>
    where
        Self: Sized;

    /// Discard every staged effect
    async fn rollback(self) -> LedgerResult<()>
    where
        Self: Sized;
}

/// Commit `unit` if `outcome` is Ok, otherwise roll it back and return the original error
///
/// A failed rollback is logged and the original error still wins: the caller
/// cares about why the operation failed, and an unfinished unit is discarded by
/// the store anyway.
pub async fn finish<U: UnitOfWork>(unit: U, outcome: LedgerResult<()>) -> LedgerResult<()> {
    match outcome {
        Ok(()) => unit.commit().await,
        Err(err) => {
            if let Err(rollback_err) = unit.rollback().await {
                tracing::error!(
                    kind = rollback_err.kind().as_str(),
                    error = %rollback_err,
                    "rollback failed"
                );
            }
            Err(err)
        }
    }
}
