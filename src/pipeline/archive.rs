//! Per-run archive of inputs and staged outputs
//!
//! ```text
//! <history>/<started-at>/
//!     input/orders.csv
//!     input/payments.csv
//!     input/customers.csv
//!     actual/transactions.csv
//!     actual/customers.csv
//! ```
//!
//! `input/` holds byte copies of the export files, `actual/` what was
//! staged for submission (including records the CRM later rejected).

use crate::core::StagedRecords;
use crate::io::csv_format::write_staged_csv;
use crate::io::ExportPaths;
use crate::types::{Contact, Opportunity, SyncError};
use chrono::NaiveDateTime;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default archive root
pub const HISTORY_DIR: &str = "csv_history";

const INPUT_DIR: &str = "input";
const ACTUAL_DIR: &str = "actual";
const TRANSACTIONS_CSV_FILE: &str = "transactions.csv";
const CUSTOMERS_CSV_FILE: &str = "customers.csv";

/// Directory name for a run started at `started_at`
pub fn run_dir_name(started_at: NaiveDateTime) -> String {
    started_at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Copy the inputs and write the staged records under a fresh run directory
///
/// Returns the run directory.
pub fn archive_run(
    history_dir: &Path,
    started_at: NaiveDateTime,
    inputs: &ExportPaths,
    staged: &StagedRecords,
) -> Result<PathBuf, SyncError> {
    let run_dir = history_dir.join(run_dir_name(started_at));
    let input_dir = run_dir.join(INPUT_DIR);
    let actual_dir = run_dir.join(ACTUAL_DIR);
    fs::create_dir_all(&input_dir)?;
    fs::create_dir_all(&actual_dir)?;

    for (name, source) in inputs.entries() {
        fs::copy(source, input_dir.join(name))?;
    }

    write_table(
        &actual_dir.join(TRANSACTIONS_CSV_FILE),
        Opportunity::COLUMNS,
        &staged.transactions,
    )?;
    write_table(
        &actual_dir.join(CUSTOMERS_CSV_FILE),
        Contact::COLUMNS,
        &staged.contacts,
    )?;

    info!(dir = %run_dir.display(), "Run archived");
    Ok(run_dir)
}

fn write_table<T: serde::Serialize>(
    path: &Path,
    header: &[&str],
    rows: &[T],
) -> Result<(), SyncError> {
    let mut out = BufWriter::new(File::create(path)?);
    write_staged_csv(header, rows, &mut out)
}
