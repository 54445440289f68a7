//! Store implementations
//!
//! - `memory` - Row-locked in-memory store (default)
//! - `postgres` - PostgreSQL store over sqlx (`postgres` feature)

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::{FaultPoint, InMemoryLedgerStore, InMemoryUnit};
#[cfg(feature = "postgres")]
pub use postgres::{PostgresLedgerStore, PostgresUnit};
