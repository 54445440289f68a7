//! Processing strategy module for operation-log replay
//!
//! This module defines the Strategy pattern for complete replay pipelines,
//! covering CSV parsing, execution against the ledger, and the final report.
//! Strategies are selected at runtime.

use crate::cli::{ReportKind, StrategyType};
use crate::core::{LedgerConfig, LedgerStore, Shop};
use crate::io::{write_balances_csv, write_history_json};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete replay pipelines
pub trait ProcessingStrategy: Send + Sync {
    /// Replay the operation log at `input_path` and write the report to `output`
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the replay completed, including when individual operations were rejected
    /// * `Err(String)` if a fatal error occurred (file not found, I/O error, store failure
    ///   while building the report)
    ///
    /// Rejected operations and unparsable records are logged and skipped.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String>;
}

/// Create a processing strategy
///
/// # Arguments
///
/// * `strategy_type` - Sync or Async
/// * `config` - Batch configuration (ignored for sync)
/// * `ledger` - Catalog and starting balance
/// * `report` - Report to write after the replay
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
    ledger: LedgerConfig,
    report: ReportKind,
) -> Box<dyn ProcessingStrategy> {
    let ledger = Arc::new(ledger);
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(ledger, report)),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config, ledger, report))
        }
    }
}

/// Write the selected report from the shop's committed state
pub(crate) async fn write_report<S: LedgerStore>(
    shop: &Shop<S>,
    report: ReportKind,
    output: &mut dyn Write,
) -> Result<(), String> {
    match report {
        ReportKind::Balances => {
            let accounts = shop
                .balances()
                .await
                .map_err(|e| format!("Failed to read balances: {}", e))?;
            write_balances_csv(&accounts, output)
        }
        ReportKind::History => {
            let histories = shop
                .histories()
                .await
                .map_err(|e| format!("Failed to read histories: {}", e))?;
            write_history_json(&histories, output)
        }
    }
}
