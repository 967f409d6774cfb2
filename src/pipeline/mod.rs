//! Sync run orchestration
//!
//! This module ties the other layers together into one incremental run:
//!
//! 1. Resolve the date window (explicit start, or the watermark)
//! 2. Load the three export files
//! 3. Resolve the record type and organization ids in the CRM
//! 4. Stage transactions and customers
//! 5. Submit every staged record, one create call each
//! 6. Archive inputs and staged tables
//! 7. Write the run totals and advance the watermark
//!
//! # Failure model
//!
//! Steps 1 through 4 either succeed completely or abort the run before any
//! remote write. During step 5 a failed create is logged, counted as skipped
//! and the run moves on to the next record. The watermark only moves once the
//! whole run completed, so an aborted run is replayed next time.

pub mod archive;
pub mod outcome;
pub mod run_log;

pub use archive::archive_run;
pub use outcome::{OutcomeCounts, RecordOutcome, RunSummary};
pub use run_log::RunLog;

use crate::config::SyncConfig;
use crate::core::{stage, CrmIds, StagedRecords};
use crate::crm::{CrmClient, ACCOUNT_OBJECT, RECORD_TYPE_OBJECT};
use crate::io::{PosExport, WatermarkStore};
use crate::types::{Contact, DateWindow, Opportunity, OpportunityPayload, SyncError};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, error, info};

/// One incremental sync run
///
/// Borrows the configuration; the CRM client and run log are passed to
/// [`Pipeline::run`] so the same pipeline can target the live CRM or an
/// in-memory one.
///
/// # Examples
///
/// ```no_run
/// use pos_crm_sync::crm::InMemoryCrm;
/// use pos_crm_sync::pipeline::Pipeline;
/// # async fn demo(config: pos_crm_sync::config::SyncConfig) -> Result<(), pos_crm_sync::types::SyncError> {
/// let started_at = chrono::Local::now().naive_local();
/// let pipeline = Pipeline::new(&config);
/// let window = pipeline.resolve_window(started_at.date())?;
/// let crm = InMemoryCrm::dry_run(&config.record_type_name, &config.organization_name);
/// let mut log = pipeline.open_log(&window, started_at)?;
/// let summary = pipeline.run(window, started_at, &crm, &mut log).await?;
/// println!("{} contacts written", summary.customers.written);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<'a> {
    config: &'a SyncConfig,
    watermark: WatermarkStore,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a SyncConfig) -> Self {
        Pipeline {
            config,
            watermark: WatermarkStore::new(&config.watermark_file),
        }
    }

    /// Window this run covers
    ///
    /// The start is the explicit start date if one was given, otherwise the
    /// day after the last recorded end (or `default_window_days` before
    /// `today` on a cold start). The end is the explicit end date or `today`.
    ///
    /// # Errors
    ///
    /// `SyncError::CorruptWatermark` if the watermark file cannot be parsed.
    pub fn resolve_window(&self, today: NaiveDate) -> Result<DateWindow, SyncError> {
        let start = match self.config.start_date {
            Some(start) => start,
            None => self
                .watermark
                .read(today, self.config.default_window_days)?,
        };
        Ok(self.config.window_from(start, today))
    }

    /// Open the run log and write this run's header line
    ///
    /// Called before anything can fail, so every block in the log starts with
    /// the mode, start time and window it belongs to.
    pub fn open_log(
        &self,
        window: &DateWindow,
        started_at: NaiveDateTime,
    ) -> Result<RunLog, SyncError> {
        let mut log = RunLog::open(&self.config.log_file)?;
        log.header(self.config.mode, self.config.dry_run, started_at, window);
        Ok(log)
    }

    /// Execute the run for `window`
    ///
    /// # Arguments
    ///
    /// * `window` - Inclusive date window, usually from [`Pipeline::resolve_window`]
    /// * `started_at` - Local start time, names the archive directory
    /// * `crm` - Target CRM
    /// * `log` - Run log from [`Pipeline::open_log`]
    ///
    /// # Returns
    ///
    /// Per-kind totals. Individual create failures are part of the totals,
    /// not errors.
    ///
    /// # Errors
    ///
    /// Any [`SyncError`] raised while loading, resolving ids or staging. The
    /// caller is expected to record it with [`RunLog::fatal`].
    pub async fn run(
        &self,
        window: DateWindow,
        started_at: NaiveDateTime,
        crm: &dyn CrmClient,
        log: &mut RunLog,
    ) -> Result<RunSummary, SyncError> {
        let paths = self.config.export_paths();
        let export = PosExport::load(&paths)?;

        let ids = self.resolve_ids(crm).await?;
        let staged = stage(&export, &ids, &window)?;
        info!(
            transactions = staged.transactions.len(),
            contacts = staged.contacts.len(),
            "Records staged"
        );

        let summary = RunSummary {
            transactions: submit_transactions(crm, &staged.transactions, log).await,
            customers: submit_contacts(crm, &staged.contacts, log).await,
        };

        self.archive(started_at, &staged, log);
        log.totals(&summary);

        if self.config.dry_run {
            info!("Dry run, watermark left unchanged");
        } else {
            self.watermark.write(window.end)?;
        }

        Ok(summary)
    }

    /// Look up the record type and organization ids
    async fn resolve_ids(&self, crm: &dyn CrmClient) -> Result<CrmIds, SyncError> {
        let record_type_id = lookup(crm, RECORD_TYPE_OBJECT, &self.config.record_type_name).await?;
        let organization_id = lookup(crm, ACCOUNT_OBJECT, &self.config.organization_name).await?;
        Ok(CrmIds {
            record_type_id,
            organization_id,
        })
    }

    // Records are already in the CRM at this point, so a failed archive must
    // not keep the watermark from advancing.
    fn archive(&self, started_at: NaiveDateTime, staged: &StagedRecords, log: &mut RunLog) {
        let paths = self.config.export_paths();
        if let Err(e) = archive_run(&self.config.history_dir, started_at, &paths, staged) {
            error!(error = %e, "Failed to archive run");
            log.note(&format!("Could not archive run: {}", e));
        }
    }
}

async fn lookup(crm: &dyn CrmClient, object: &str, name: &str) -> Result<String, SyncError> {
    let id = crm
        .lookup_id(object, name)
        .await?
        .ok_or_else(|| SyncError::lookup_not_found(object, name))?;
    debug!(object, name, %id, "Resolved CRM id");
    Ok(id)
}

async fn submit_transactions(
    crm: &dyn CrmClient,
    staged: &[Opportunity],
    log: &mut RunLog,
) -> OutcomeCounts {
    let mut counts = OutcomeCounts::default();
    log.section("Transactions");

    for opportunity in staged {
        let outcome = match OpportunityPayload::try_from(opportunity) {
            Ok(payload) => match crm.create_opportunity(&payload).await {
                Ok(id) => RecordOutcome::Inserted(id),
                Err(e) => e.into(),
            },
            Err(e) => e.into(),
        };

        match &outcome {
            RecordOutcome::Inserted(_) => log.transaction_inserted(&opportunity.name),
            RecordOutcome::Rejected(reason) | RecordOutcome::Failed(reason) => {
                log.transaction_skipped(&opportunity.name, reason)
            }
        }
        counts.record(&outcome);
    }

    counts
}

async fn submit_contacts(crm: &dyn CrmClient, staged: &[Contact], log: &mut RunLog) -> OutcomeCounts {
    let mut counts = OutcomeCounts::default();
    log.section("Customers");

    for contact in staged {
        let outcome = match crm.create_contact(contact).await {
            Ok(id) => RecordOutcome::Inserted(id),
            Err(e) => e.into(),
        };

        let full_name = contact.full_name();
        match &outcome {
            RecordOutcome::Inserted(_) => log.customer_inserted(&full_name),
            RecordOutcome::Rejected(reason) | RecordOutcome::Failed(reason) => {
                log.customer_skipped(&full_name, reason)
            }
        }
        counts.record(&outcome);
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Mode, DEFAULT_ORGANIZATION, DEFAULT_RECORD_TYPE};
    use crate::crm::InMemoryCrm;
    use crate::io::loader::{CUSTOMERS_CSV_FILE, ORDERS_CSV_FILE, PAYMENTS_CSV_FILE};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const ORDERS: &str = "Order ID,Customer Name\nO1,Jane Doe\n";
    const PAYMENTS: &str = "Order ID,Payment Date,Amount,Note,Order Payment State\n\
                            O1,05-Mar-2024 02:15 PM EST,12.5,123,Paid\n";
    const CUSTOMERS: &str = "Customer Since,First Name,Last Name,Phone,Email\n\
                             05-Mar-2024 02:15 PM EST,Jane,Doe,,\n";

    fn config(root: &Path) -> SyncConfig {
        SyncConfig {
            mode: Mode::Test,
            dry_run: false,
            start_date: None,
            end_date: None,
            data_dir: root.to_path_buf(),
            history_dir: root.join("csv_history"),
            log_file: root.join("log.txt"),
            watermark_file: root.join("last_run.txt"),
            default_window_days: 7,
            record_type_name: DEFAULT_RECORD_TYPE.to_string(),
            organization_name: DEFAULT_ORGANIZATION.to_string(),
        }
    }

    fn write_export(root: &Path) {
        fs::write(root.join(ORDERS_CSV_FILE), ORDERS).unwrap();
        fs::write(root.join(PAYMENTS_CSV_FILE), PAYMENTS).unwrap();
        fs::write(root.join(CUSTOMERS_CSV_FILE), CUSTOMERS).unwrap();
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn started_at() -> NaiveDateTime {
        date(3, 10).and_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn test_resolve_window_prefers_explicit_start() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("last_run.txt"), "03-01-2024\n").unwrap();
        let mut config = config(dir.path());

        let window = Pipeline::new(&config).resolve_window(date(3, 10)).unwrap();
        assert_eq!(window, DateWindow::new(date(3, 2), date(3, 10)));

        config.start_date = Some(date(2, 1));
        config.end_date = Some(date(2, 29));
        let window = Pipeline::new(&config).resolve_window(date(3, 10)).unwrap();
        assert_eq!(window, DateWindow::new(date(2, 1), date(2, 29)));
    }

    #[test]
    fn test_resolve_window_rejects_corrupt_watermark() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("last_run.txt"), "yesterday").unwrap();
        let config = config(dir.path());

        let result = Pipeline::new(&config).resolve_window(date(3, 10));

        assert!(matches!(result, Err(SyncError::CorruptWatermark { .. })));
    }

    #[test]
    fn test_open_log_writes_header_first() {
        let dir = TempDir::new().unwrap();
        let mut config = config(dir.path());
        config.dry_run = true;
        let window = DateWindow::new(date(3, 4), date(3, 10));

        let log = Pipeline::new(&config).open_log(&window, started_at()).unwrap();
        drop(log);

        let written = fs::read_to_string(&config.log_file).unwrap();
        assert!(written.starts_with("[TEST DRY-RUN] "));
        assert!(written.ends_with(" (03-04-2024 - 03-10-2024)\n"));
    }

    #[tokio::test]
    async fn test_run_submits_and_advances_watermark() {
        let dir = TempDir::new().unwrap();
        write_export(dir.path());
        let config = config(dir.path());
        let crm = InMemoryCrm::dry_run(DEFAULT_RECORD_TYPE, DEFAULT_ORGANIZATION);
        let window = DateWindow::new(date(3, 4), date(3, 10));

        let summary = {
            let pipeline = Pipeline::new(&config);
            let mut log = pipeline.open_log(&window, started_at()).unwrap();
            pipeline
                .run(window, started_at(), &crm, &mut log)
                .await
                .unwrap()
        };

        assert_eq!(summary.transactions.written, 1);
        assert_eq!(summary.customers.written, 1);
        assert_eq!(crm.opportunities()[0].record_type_id, "DRY-RUN-RECORD-TYPE");
        assert_eq!(
            fs::read_to_string(&config.watermark_file).unwrap(),
            "03-10-2024\n"
        );
        assert!(config
            .history_dir
            .join(archive::run_dir_name(started_at()))
            .join("actual")
            .join("transactions.csv")
            .exists());
    }

    #[tokio::test]
    async fn test_dry_run_leaves_watermark_alone() {
        let dir = TempDir::new().unwrap();
        write_export(dir.path());
        let mut config = config(dir.path());
        config.dry_run = true;
        let crm = InMemoryCrm::dry_run(DEFAULT_RECORD_TYPE, DEFAULT_ORGANIZATION);

        let mut log = RunLog::open(&config.log_file).unwrap();
        Pipeline::new(&config)
            .run(
                DateWindow::new(date(3, 4), date(3, 10)),
                started_at(),
                &crm,
                &mut log,
            )
            .await
            .unwrap();

        assert!(!config.watermark_file.exists());
    }

    #[tokio::test]
    async fn test_missing_organization_aborts_before_writes() {
        let dir = TempDir::new().unwrap();
        write_export(dir.path());
        let config = config(dir.path());
        let crm = InMemoryCrm::new().with_lookup(RECORD_TYPE_OBJECT, DEFAULT_RECORD_TYPE, "012RT");

        let mut log = RunLog::open(&config.log_file).unwrap();
        let result = Pipeline::new(&config)
            .run(
                DateWindow::new(date(3, 4), date(3, 10)),
                started_at(),
                &crm,
                &mut log,
            )
            .await;

        assert_eq!(
            result,
            Err(SyncError::lookup_not_found(ACCOUNT_OBJECT, DEFAULT_ORGANIZATION))
        );
        assert!(crm.opportunities().is_empty());
        assert!(crm.contacts().is_empty());
        assert!(!config.watermark_file.exists());
    }

    #[tokio::test]
    async fn test_unparseable_amount_is_skipped() {
        let dir = TempDir::new().unwrap();
        write_export(dir.path());
        fs::write(
            dir.path().join(PAYMENTS_CSV_FILE),
            "Order ID,Payment Date,Amount,Note,Order Payment State\n\
             O1,05-Mar-2024 02:15 PM EST,twelve,123,Paid\n\
             O1,06-Mar-2024 10:00 AM EST,5.25,124,Paid\n",
        )
        .unwrap();
        let config = config(dir.path());
        let crm = InMemoryCrm::dry_run(DEFAULT_RECORD_TYPE, DEFAULT_ORGANIZATION);

        let mut log = RunLog::open(&config.log_file).unwrap();
        let summary = Pipeline::new(&config)
            .run(
                DateWindow::new(date(3, 4), date(3, 10)),
                started_at(),
                &crm,
                &mut log,
            )
            .await
            .unwrap();

        assert_eq!(
            summary.transactions,
            OutcomeCounts {
                written: 1,
                rejected: 1,
                failed: 0
            }
        );
        assert_eq!(crm.opportunities().len(), 1);
    }
}
