//! Confirmation prompt before columns are dropped

use anyhow::Result;
use dialoguer::Confirm;

/// Ask whether the columns found by the reducer should be dropped.
/// Answering no keeps every column.
pub fn confirm_drop_columns(column_count: usize, threshold: f64) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(format!(
            "Drop {} column(s) correlated at |r| >= {:.2} with a kept column?",
            column_count, threshold
        ))
        .default(true)
        .interact()?;
    Ok(confirmed)
}
