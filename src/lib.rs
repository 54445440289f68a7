//! Coin Ledger Library
//! # Overview
//!
//! The coin ledger behind a company shop: employees hold coin balances,
//! transfer coins to each other and spend them on catalog items. The library
//! enforces the balance invariants and produces the history of both.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Account, records, Operation, history view, errors)
//! - [`core`] - Business logic:
//!   - [`core::traits`] - `LedgerStore` / `UnitOfWork` abstractions
//!   - [`core::transfer`] - Peer-to-peer transfers
//!   - [`core::purchase`] - Catalog purchases
//!   - [`core::registry`] - Account registration
//!   - [`core::history`] - Read-only history views
//!   - [`core::shop`] - Facade dispatching operations
//! - [`store`] - Store implementations (in-memory, PostgreSQL behind the `postgres` feature)
//! - [`io`] - Operation-log parsing and report output
//! - [`strategy`] - Sequential and concurrent replay strategies
//! - [`cli`] - CLI arguments parsing
//! - [`telemetry`] - Tracing subscriber setup
//!
//! # Invariants
//!
//! - Every balance is >= 0 under any concurrent schedule
//! - A transfer or purchase applies all of its effects or none, including when
//!   the future running it is cancelled
//! - Validation failures are detected before anything is mutated

pub mod cli;
pub mod core;
pub mod io;
pub mod store;
pub mod strategy;
pub mod telemetry;
pub mod types;

pub use core::{
    AccountRegistry, Catalog, HistoryAssembler, LedgerConfig, LedgerStore, PurchaseEngine, Shop,
    TransferEngine, UnitOfWork,
};
pub use io::{write_balances_csv, write_history_json};
pub use store::{FaultPoint, InMemoryLedgerStore};
pub use types::{
    Account, AccountHistory, Coins, ErrorKind, LedgerError, LedgerResult, Operation,
    PurchaseRecord, TransferRecord, Username,
};
