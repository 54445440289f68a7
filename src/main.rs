//! Coin Ledger CLI
//!
//! Replays a company-shop operation log and prints a report to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > balances.csv
//! cargo run -- --report history operations.csv > history.json
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 operations.csv
//! cargo run -- --catalog prices.csv --starting-balance 500 operations.csv
//! RUST_LOG=debug cargo run -- operations.csv
//! ```
//!
//! # Processing Strategies
//!
//! - **sync**: One operation at a time in file order (default)
//! - **async**: Batches partitioned by acting user, run on a multi-threaded runtime
//!
//! # Exit Codes
//!
//! - 0: Success (rejected operations are logged, not fatal)
//! - 1: Error (missing input, unreadable catalog, I/O failure)

use coin_ledger::cli;
use coin_ledger::strategy;
use coin_ledger::telemetry;
use std::process;

fn main() {
    telemetry::init();

    let args = cli::parse_args();

    let ledger = match args.to_ledger_config() {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy.clone(), config, ledger, args.report)
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
