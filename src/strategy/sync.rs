//! Sequential processing strategy
//!
//! Replays the operation log one operation at a time, in file order, on a
//! single-threaded tokio runtime. Output is fully determined by the input.
//!
//! # Design
//!
//! The strategy only orchestrates:
//! - CSV parsing is delegated to `SyncReader` (iterator interface)
//! - Execution is delegated to `Shop` over an `InMemoryLedgerStore`
//! - Output is delegated to the report writers in `io`

use crate::cli::ReportKind;
use crate::core::{log_rejection, LedgerConfig, Shop};
use crate::io::sync_reader::SyncReader;
use crate::store::InMemoryLedgerStore;
use crate::strategy::{write_report, ProcessingStrategy};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Sequential processing strategy
#[derive(Debug, Clone)]
pub struct SyncProcessingStrategy {
    ledger: Arc<LedgerConfig>,
    report: ReportKind,
}

impl SyncProcessingStrategy {
    pub fn new(ledger: Arc<LedgerConfig>, report: ReportKind) -> Self {
        Self { ledger, report }
    }
}

impl Default for SyncProcessingStrategy {
    fn default() -> Self {
        Self::new(Arc::new(LedgerConfig::default()), ReportKind::Balances)
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    /// Replay the log in file order and write the report
    ///
    /// Fatal errors (file not found, I/O errors) are returned immediately.
    /// Rejected operations are logged and the replay continues.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let reader = SyncReader::new(input_path)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let shop = Shop::new(
                Arc::new(InMemoryLedgerStore::new()),
                Arc::clone(&self.ledger),
            );

            let mut replayed = 0usize;
            let mut rejected = 0usize;
            for result in reader {
                match result {
                    Ok(operation) => {
                        replayed += 1;
                        if let Err(e) = shop.execute(&operation).await {
                            rejected += 1;
                            log_rejection(&operation, &e);
                        }
                    }
                    Err(e) => warn!("CSV parsing error: {}", e),
                }
            }
            info!(replayed, rejected, "replay finished");

            write_report(&shop, self.report, output).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Catalog;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn run(strategy: &SyncProcessingStrategy, csv: &str) -> String {
        let file = create_temp_csv(csv);
        let mut output = Vec::new();
        strategy.process(file.path(), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_sync_strategy_replays_in_order() {
        let csv = "op,user,target,amount\n\
                   register,alice,,\n\
                   register,bob,,\n\
                   transfer,alice,bob,100\n\
                   buy,bob,cup,2\n";

        let output = run(&SyncProcessingStrategy::default(), csv);

        assert_eq!(output, "username,coins\nalice,900\nbob,1060\n");
    }

    #[test]
    fn test_sync_strategy_continues_after_rejections() {
        let csv = "op,user,target,amount\n\
                   register,alice,,\n\
                   register,alice,,\n\
                   transfer,alice,alice,5\n\
                   transfer,alice,ghost,5\n\
                   not-an-op,alice,,\n\
                   buy,alice,yacht,\n\
                   buy,alice,pen,\n";

        let output = run(&SyncProcessingStrategy::default(), csv);

        assert_eq!(output, "username,coins\nalice,990\n");
    }

    #[test]
    fn test_sync_strategy_uses_ledger_config() {
        let catalog = Catalog::from_items([("socks", 1000)]).unwrap();
        let strategy = SyncProcessingStrategy::new(
            Arc::new(LedgerConfig::new(catalog, 1000)),
            ReportKind::Balances,
        );
        let csv = "op,user,target,amount\nregister,alice,,\nbuy,alice,socks,1\n";

        assert_eq!(run(&strategy, csv), "username,coins\nalice,0\n");
    }

    #[test]
    fn test_sync_strategy_history_report() {
        let strategy = SyncProcessingStrategy::new(
            Arc::new(LedgerConfig::default()),
            ReportKind::History,
        );
        let csv = "op,user,target,amount\nregister,dave,,\n";

        let value: serde_json::Value = serde_json::from_str(&run(&strategy, csv)).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "dave": { "coins": 1000, "inventory": [], "coinHistory": { "received": [], "sent": [] } }
            })
        );
    }

    #[test]
    fn test_sync_strategy_handles_missing_file() {
        let mut output = Vec::new();

        let result = SyncProcessingStrategy::default().process(Path::new("nonexistent.csv"), &mut output);

        assert!(result.unwrap_err().contains("Failed to open file"));
        assert!(output.is_empty());
    }

    #[test]
    fn test_sync_strategy_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SyncProcessingStrategy>();
    }
}
