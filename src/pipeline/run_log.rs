//! Human-readable run log
//!
//! Each run appends one block to a plain-text file:
//!
//! ```text
//! [PROD] Sun Mar 10 09:00:00 2024 (03-04-2024 - 03-10-2024)
//! Transactions:
//!     Inserted transaction 'Jane Doe - Shipment CRID(s): 123 03/05/2024 = $12.50'
//! Customers:
//!     Could not insert customer Ada Lovelace
//!     Error: rejected with status 400: REQUIRED_FIELD_MISSING: ...
//! 0 customer records written, 1 skipped
//! 1 transaction records written, 0 skipped
//! ```
//!
//! The file is opened once per run and flushed when the log is dropped, so a
//! fatal error still leaves everything written so far on disk. Every line is
//! also emitted as a `tracing` event.

use crate::config::Mode;
use crate::pipeline::outcome::RunSummary;
use crate::types::{DateWindow, SyncError};
use chrono::NaiveDateTime;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{error, info, warn};

/// Default run log file name
pub const LOG_FILE: &str = "log.txt";

/// Append-only writer for one run's block
pub struct RunLog {
    writer: BufWriter<File>,
}

impl RunLog {
    /// Open `path` for appending, creating it and its directory if needed
    pub fn open(path: &Path) -> Result<Self, SyncError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.writer, "{}", text) {
            warn!(error = %e, "Failed to write run log");
        }
    }

    /// First line of a block
    pub fn header(
        &mut self,
        mode: Mode,
        dry_run: bool,
        started_at: NaiveDateTime,
        window: &DateWindow,
    ) {
        let tag = if dry_run {
            format!("{} DRY-RUN", mode.tag())
        } else {
            mode.tag().to_string()
        };
        let started = started_at.format("%c").to_string();
        info!(mode = %tag, %started, %window, "Sync run started");
        self.line(&format!("[{}] {} ({})", tag, started, window));
    }

    pub fn section(&mut self, title: &str) {
        self.line(&format!("{}:", title));
    }

    pub fn transaction_inserted(&mut self, name: &str) {
        info!(name, "Inserted transaction");
        self.line(&format!("\tInserted transaction '{}'", name));
    }

    pub fn transaction_skipped(&mut self, name: &str, reason: &str) {
        warn!(name, reason, "Could not insert transaction");
        self.line(&format!("\tCould not insert transaction '{}'", name));
        self.line(&format!("\tError: {}", reason));
    }

    pub fn customer_inserted(&mut self, full_name: &str) {
        info!(name = full_name, "Inserted customer");
        self.line(&format!("\tInserted customer {}", full_name));
    }

    pub fn customer_skipped(&mut self, full_name: &str, reason: &str) {
        warn!(name = full_name, reason, "Could not insert customer");
        self.line(&format!("\tCould not insert customer {}", full_name));
        self.line(&format!("\tError: {}", reason));
    }

    /// Non-fatal problem worth keeping in the audit trail
    pub fn note(&mut self, text: &str) {
        warn!("{}", text);
        self.line(&format!("[WARN] {}", text));
    }

    /// Closing counts; the blank line separates runs
    pub fn totals(&mut self, summary: &RunSummary) {
        let customers = summary.customers;
        let transactions = summary.transactions;
        info!(
            customers_written = customers.written,
            customers_skipped = customers.skipped(),
            transactions_written = transactions.written,
            transactions_skipped = transactions.skipped(),
            "Sync run finished"
        );
        self.line(&format!(
            "{} customer records written, {} skipped{}",
            customers.written,
            customers.skipped(),
            transport_note(customers.failed)
        ));
        self.line(&format!(
            "{} transaction records written, {} skipped{}",
            transactions.written,
            transactions.skipped(),
            transport_note(transactions.failed)
        ));
        self.line("");
    }

    /// Record the error that aborted the run
    pub fn fatal(&mut self, err: &SyncError) {
        error!(error = %err, "Sync run aborted");
        self.line(&format!("[ERROR] {}", err));
        self.line("");
    }
}

fn transport_note(failed: usize) -> String {
    if failed == 0 {
        String::new()
    } else {
        format!(" ({} transport errors)", failed)
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            warn!(error = %e, "Failed to flush run log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::outcome::OutcomeCounts;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn started_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn window() -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        )
    }

    #[test]
    fn test_block_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LOG_FILE);

        {
            let mut log = RunLog::open(&path).unwrap();
            log.header(Mode::Production, false, started_at(), &window());
            log.section("Transactions");
            log.transaction_inserted("Jane - Shipment CRID(s): 1 03/05/2024 = $1.00");
            log.section("Customers");
            log.customer_skipped("Ada Lovelace", "rejected with status 400: nope");
            log.totals(&RunSummary {
                transactions: OutcomeCounts {
                    written: 1,
                    rejected: 0,
                    failed: 0,
                },
                customers: OutcomeCounts {
                    written: 0,
                    rejected: 1,
                    failed: 0,
                },
            });
        }

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[PROD] Sun Mar 10 09:00:00 2024 (03-04-2024 - 03-10-2024)\n\
             Transactions:\n\
             \tInserted transaction 'Jane - Shipment CRID(s): 1 03/05/2024 = $1.00'\n\
             Customers:\n\
             \tCould not insert customer Ada Lovelace\n\
             \tError: rejected with status 400: nope\n\
             0 customer records written, 1 skipped\n\
             1 transaction records written, 0 skipped\n\
             \n"
        );
    }

    #[test]
    fn test_open_appends_across_runs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join(LOG_FILE);

        RunLog::open(&path).unwrap().section("First");
        RunLog::open(&path).unwrap().section("Second");

        assert_eq!(fs::read_to_string(&path).unwrap(), "First:\nSecond:\n");
    }

    #[test]
    fn test_fatal_and_transport_note() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LOG_FILE);

        {
            let mut log = RunLog::open(&path).unwrap();
            log.header(Mode::Test, true, started_at(), &window());
            log.totals(&RunSummary {
                transactions: OutcomeCounts::default(),
                customers: OutcomeCounts {
                    written: 2,
                    rejected: 1,
                    failed: 2,
                },
            });
            log.fatal(&SyncError::lookup_not_found("Account", "Curbside"));
        }

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("[TEST DRY-RUN] "));
        assert!(content.contains("2 customer records written, 3 skipped (2 transport errors)\n"));
        assert!(content.contains("[ERROR] No Account found named 'Curbside'\n"));
    }
}
