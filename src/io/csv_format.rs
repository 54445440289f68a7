//! CSV format handling for operation logs and balance output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to [`Operation`]s
//! - Balance output serialization
//!
//! All functions are pure (no I/O beyond the writer they are handed) for easy testing.
//!
//! # Input Format
//!
//! ```text
//! op,user,target,amount
//! register,alice,,
//! transfer,alice,bob,100
//! buy,bob,cup,2
//! buy,bob,pen,
//! ```

use crate::types::{Account, Coins, Operation};
use serde::Deserialize;
use std::io::Write;

/// CSV record structure for deserialization
///
/// Matches the input CSV format with columns: op, user, target, amount.
/// `target` is the receiver of a transfer or the item of a purchase, and
/// `amount` the coins of a transfer or the quantity of a purchase.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    pub op: String,
    pub user: String,
    pub target: Option<String>,
    pub amount: Option<String>,
}

/// Quantity bought when a `buy` row leaves the amount empty
pub const DEFAULT_BUY_QUANTITY: i64 = 1;

/// Convert a CsvRecord to an Operation
///
/// # Returns
///
/// * `Ok(Operation)` - Successfully converted record
/// * `Err(String)` - Unknown op, missing field, or unparsable integer
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<Operation, String> {
    let op = csv_record.op.trim().to_lowercase();
    let user = non_empty(Some(csv_record.user))
        .ok_or_else(|| format!("{} operation requires a user", op))?;

    match op.as_str() {
        "register" => Ok(Operation::Register { username: user }),
        "transfer" => {
            let to = non_empty(csv_record.target)
                .ok_or_else(|| format!("transfer from {} requires a target user", user))?;
            let amount = non_empty(csv_record.amount)
                .ok_or_else(|| format!("transfer from {} requires an amount", user))?;
            Ok(Operation::Transfer {
                amount: parse_integer(&amount, &user)?,
                from: user,
                to,
            })
        }
        "buy" => {
            let item = non_empty(csv_record.target)
                .ok_or_else(|| format!("buy by {} requires an item", user))?;
            let quantity = match non_empty(csv_record.amount) {
                Some(quantity) => parse_integer(&quantity, &user)?,
                None => DEFAULT_BUY_QUANTITY,
            };
            Ok(Operation::Buy {
                account: user,
                item,
                quantity,
            })
        }
        _ => Err(format!(
            "Invalid operation: '{}' for user {}",
            csv_record.op, user
        )),
    }
}

fn non_empty(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_integer(value: &str, user: &str) -> Result<Coins, String> {
    value
        .parse::<Coins>()
        .map_err(|_| format!("Invalid amount '{}' for user {}", value, user))
}

/// Write balances to CSV format
///
/// Writes accounts with columns: username, coins. Accounts are sorted by
/// username for deterministic output.
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_balances_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(["username", "coins"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_accounts = accounts.to_vec();
    sorted_accounts.sort_by(|a, b| a.username.cmp(&b.username));

    for account in sorted_accounts {
        writer
            .write_record([account.username, account.coins.to_string()])
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
