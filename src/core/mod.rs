//! Core business logic module
//!
//! This module contains the ledger's engines and the abstractions they drive:
//! - `traits` - Store and unit-of-work abstractions
//! - `catalog` - Item prices and the immutable ledger configuration
//! - `transfer` - Peer-to-peer transfers
//! - `purchase` - Catalog purchases
//! - `registry` - Account registration
//! - `history` - Read-only history views
//! - `shop` - Facade dispatching operations to the engines
//! - `batch_processor` - Concurrent, actor-partitioned batch execution

pub mod batch_processor;
pub mod catalog;
pub mod history;
pub mod purchase;
pub mod registry;
pub mod shop;
pub mod traits;
pub mod transfer;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use catalog::{Catalog, LedgerConfig, DEFAULT_STARTING_BALANCE};
pub use history::HistoryAssembler;
pub use purchase::PurchaseEngine;
pub use registry::AccountRegistry;
pub use shop::{log_rejection, Shop};
pub use traits::{finish, LedgerStore, UnitOfWork};
pub use transfer::TransferEngine;
