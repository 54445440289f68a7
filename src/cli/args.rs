use crate::core::{Catalog, LedgerConfig, DEFAULT_STARTING_BALANCE};
use crate::strategy::BatchConfig;
use crate::types::Coins;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replay a company-shop operation log through the coin ledger
#[derive(Parser, Debug)]
#[command(name = "coin-ledger")]
#[command(about = "Replay a company-shop operation log through the coin ledger", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing operation records
    #[arg(value_name = "INPUT", help = "Path to the input CSV operation log")]
    pub input_file: PathBuf,

    /// Processing strategy to use for the replay
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "sync",
        help = "Processing strategy: 'sync' replays in file order, 'async' runs each user's operations concurrently"
    )]
    pub strategy: StrategyType,

    /// Number of operations per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Maximum number of concurrent workers (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Catalog CSV with header `item,price`
    #[arg(
        long = "catalog",
        value_name = "FILE",
        help = "Catalog CSV with header 'item,price' (default: the standard shop catalog)"
    )]
    pub catalog: Option<PathBuf>,

    /// Balance new accounts open with
    #[arg(
        long = "starting-balance",
        value_name = "COINS",
        default_value_t = DEFAULT_STARTING_BALANCE,
        allow_negative_numbers = true,
        help = "Coins a newly registered account starts with"
    )]
    pub starting_balance: Coins,

    /// Report written to stdout after the replay
    #[arg(
        long = "report",
        value_name = "REPORT",
        default_value = "balances",
        help = "Output report: 'balances' (CSV) or 'history' (JSON)"
    )]
    pub report: ReportKind,
}

/// Available processing strategies
#[derive(Clone, Debug, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

/// Available output reports
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// `username,coins` CSV sorted by username
    Balances,
    /// JSON object of account histories keyed by username
    History,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values fall back to the defaults; zero values fall back with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    /// Build the ledger configuration from the catalog file and starting balance
    ///
    /// # Returns
    ///
    /// * `Ok(LedgerConfig)` - Standard catalog unless `--catalog` was given
    /// * `Err(String)` - The catalog file is missing or invalid
    pub fn to_ledger_config(&self) -> Result<LedgerConfig, String> {
        let catalog = match &self.catalog {
            Some(path) => Catalog::from_path(path)?,
            None => Catalog::standard(),
        };
        Ok(LedgerConfig::new(catalog, self.starting_balance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[rstest]
    #[case::default_strategy(&["program", "input.csv"], StrategyType::Sync)]
    #[case::explicit_sync(&["program", "--strategy", "sync", "input.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["program", "--strategy", "async", "input.csv"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        match (&parsed.strategy, &expected) {
            (StrategyType::Sync, StrategyType::Sync) => (),
            (StrategyType::Async, StrategyType::Async) => (),
            _ => panic!("Expected {:?}, got {:?}", expected, parsed.strategy),
        }
    }

    #[rstest]
    #[case::default_report(&["program", "input.csv"], ReportKind::Balances)]
    #[case::history_report(&["program", "--report", "history", "input.csv"], ReportKind::History)]
    fn test_report_parsing(#[case] args: &[&str], #[case] expected: ReportKind) {
        assert_eq!(CliArgs::try_parse_from(args).unwrap().report, expected);
    }

    #[rstest]
    #[case::batch_size(&["program", "--batch-size", "2000", "input.csv"], Some(2000), None)]
    #[case::max_concurrent(&["program", "--max-concurrent", "8", "input.csv"], None, Some(8))]
    #[case::no_options(&["program", "input.csv"], None, None)]
    #[case::all_options(
        &["program", "--strategy", "async", "--batch-size", "2000", "--max-concurrent", "8", "input.csv"],
        Some(2000),
        Some(8)
    )]
    fn test_config_options(
        #[case] args: &[&str],
        #[case] batch_size: Option<usize>,
        #[case] max_concurrent: Option<usize>,
    ) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.batch_size, batch_size);
        assert_eq!(parsed.max_concurrent_batches, max_concurrent);
    }

    #[rstest]
    #[case::all_defaults(&["program", "input.csv"], 1000, num_cpus::get())]
    #[case::custom_batch_size(&["program", "--batch-size", "2000", "input.csv"], 2000, num_cpus::get())]
    #[case::custom_max_concurrent(&["program", "--max-concurrent", "8", "input.csv"], 1000, 8)]
    #[case::zero_batch_size(&["program", "--batch-size", "0", "input.csv"], 1000, num_cpus::get())]
    #[case::zero_max_concurrent(&["program", "--max-concurrent", "0", "input.csv"], 1000, num_cpus::get())]
    fn test_batch_config_conversion(
        #[case] args: &[&str],
        #[case] expected_batch_size: usize,
        #[case] expected_max_concurrent: usize,
    ) {
        let config = CliArgs::try_parse_from(args).unwrap().to_batch_config();

        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.max_concurrent_batches, expected_max_concurrent);
    }

    #[rstest]
    #[case::default(&["program", "input.csv"], 1000)]
    #[case::custom(&["program", "--starting-balance", "250", "input.csv"], 250)]
    #[case::negative(&["program", "--starting-balance", "-5", "input.csv"], -5)]
    fn test_starting_balance(#[case] args: &[&str], #[case] expected: Coins) {
        let config = CliArgs::try_parse_from(args)
            .unwrap()
            .to_ledger_config()
            .unwrap();

        assert_eq!(config.starting_balance, expected);
        assert_eq!(config.catalog, Catalog::standard());
    }

    #[test]
    fn test_catalog_file_replaces_standard_catalog() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"item,price\nsocks,1000\n").unwrap();
        file.flush().unwrap();
        let path = file.path().to_str().unwrap();

        let config = CliArgs::try_parse_from(["program", "--catalog", path, "input.csv"])
            .unwrap()
            .to_ledger_config()
            .unwrap();

        assert_eq!(config.catalog.len(), 1);
        assert_eq!(config.catalog.price("socks"), Some(1000));
    }

    #[test]
    fn test_missing_catalog_file() {
        let err = CliArgs::try_parse_from(["program", "--catalog", "no/such.csv", "input.csv"])
            .unwrap()
            .to_ledger_config()
            .unwrap_err();

        assert!(err.contains("Failed to open catalog"));
    }

    #[rstest]
    #[case::missing_input(&["program"])]
    #[case::invalid_strategy(&["program", "--strategy", "invalid", "input.csv"])]
    #[case::invalid_report(&["program", "--report", "ledger", "input.csv"])]
    #[case::invalid_starting_balance(&["program", "--starting-balance", "lots", "input.csv"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
