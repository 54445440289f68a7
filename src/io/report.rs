//! JSON history report
//!
//! Writes one object keyed by username whose values are account histories,
//! in the shape the shop's info endpoint returns.

use crate::types::{AccountHistory, Username};
use std::collections::BTreeMap;
use std::io::Write;

/// Write every account's history as pretty-printed JSON
///
/// Keys come out sorted by username. Empty lists are rendered as `[]`.
pub fn write_history_json(
    histories: &BTreeMap<Username, AccountHistory>,
    output: &mut dyn Write,
) -> Result<(), String> {
    serde_json::to_writer_pretty(&mut *output, histories)
        .map_err(|e| format!("Failed to write history report: {}", e))?;
    writeln!(output).map_err(|e| format!("Failed to write history report: {}", e))?;
    output
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}
