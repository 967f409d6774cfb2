use crate::config::{Mode, SyncConfig, DEFAULT_ORGANIZATION, DEFAULT_RECORD_TYPE};
use crate::io::watermark::{DEFAULT_WINDOW_DAYS, WATERMARK_FILE};
use crate::pipeline::archive::HISTORY_DIR;
use crate::pipeline::run_log::LOG_FILE;
use crate::types::dates::parse_mdy;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Sync new point-of-sale payments and customers into the CRM
#[derive(Parser, Debug)]
#[command(name = "pos-crm-sync")]
#[command(
    about = "Sync new point-of-sale payments and customers into the CRM",
    long_about = None
)]
pub struct CliArgs {
    /// First day of the window; the day after the last run when omitted
    #[arg(value_name = "START_DATE", value_parser = parse_date, help = "Window start, mm-dd-yyyy")]
    pub start_date: Option<NaiveDate>,

    /// Last day of the window; today when omitted
    #[arg(value_name = "END_DATE", value_parser = parse_date, help = "Window end, mm-dd-yyyy")]
    pub end_date: Option<NaiveDate>,

    /// Target the sandbox instance and read `.env.test`
    #[arg(short = 't', long = "test")]
    pub test: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,

    /// Stage and log everything without contacting the CRM
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    #[arg(
        long = "data-dir",
        value_name = "DIR",
        default_value = ".",
        help = "Directory holding orders.csv, payments.csv and customers.csv"
    )]
    pub data_dir: PathBuf,

    #[arg(
        long = "history-dir",
        value_name = "DIR",
        default_value = HISTORY_DIR,
        help = "Root directory of the per-run archive"
    )]
    pub history_dir: PathBuf,

    #[arg(
        long = "log-file",
        value_name = "FILE",
        default_value = LOG_FILE,
        help = "Append-only run log"
    )]
    pub log_file: PathBuf,

    #[arg(
        long = "watermark-file",
        value_name = "FILE",
        default_value = WATERMARK_FILE,
        help = "File holding the end date of the last run"
    )]
    pub watermark_file: PathBuf,

    #[arg(
        long = "default-window-days",
        value_name = "DAYS",
        default_value_t = DEFAULT_WINDOW_DAYS,
        help = "Window length when no previous run is recorded"
    )]
    pub default_window_days: u64,

    #[arg(
        long = "record-type",
        value_name = "NAME",
        default_value = DEFAULT_RECORD_TYPE,
        help = "Record type of created opportunities"
    )]
    pub record_type: String,

    #[arg(
        long = "organization",
        value_name = "NAME",
        default_value = DEFAULT_ORGANIZATION,
        help = "Organization every record is attached to"
    )]
    pub organization: String,

    #[arg(
        long = "timeout-secs",
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..),
        default_value_t = 30,
        help = "Timeout of each CRM request"
    )]
    pub timeout_secs: u64,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    parse_mdy(value).map_err(|e| e.to_string())
}

impl CliArgs {
    pub fn mode(&self) -> Mode {
        Mode::from_test_flag(self.test)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the run configuration from the parsed arguments
    pub fn to_config(&self) -> SyncConfig {
        SyncConfig {
            mode: self.mode(),
            dry_run: self.dry_run,
            start_date: self.start_date,
            end_date: self.end_date,
            data_dir: self.data_dir.clone(),
            history_dir: self.history_dir.clone(),
            log_file: self.log_file.clone(),
            watermark_file: self.watermark_file.clone(),
            default_window_days: self.default_window_days,
            record_type_name: self.record_type.clone(),
            organization_name: self.organization.clone(),
        }
    }
}
