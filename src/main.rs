//! POS to CRM Sync CLI
//!
//! Pushes new point-of-sale payments and customers into the CRM.
//!
//! # Usage
//!
//! ```bash
//! pos-crm-sync                          # from the last run up to today
//! pos-crm-sync 03-01-2024               # from March 1st up to today
//! pos-crm-sync 03-01-2024 03-07-2024    # explicit window
//! pos-crm-sync -t -y                    # sandbox, no prompt
//! pos-crm-sync --dry-run                # stage and log only
//! ```
//!
//! The three export files are read from `--data-dir`. Credentials come from
//! `SF_USERNAME`, `SF_PASSWORD` and `SF_TOKEN`, seeded from `.env` (or
//! `.env.test` with `-t`).
//!
//! # Exit Codes
//!
//! - 0: Success, or the operator declined the prompt
//! - 1: Fatal error (bad arguments, missing file, failed login, etc.)

use chrono::{Local, NaiveDateTime};
use pos_crm_sync::cli::{self, CliArgs};
use pos_crm_sync::config::{load_dotenv, login_url_override, Credentials, SyncConfig};
use pos_crm_sync::crm::{InMemoryCrm, SalesforceClient, SalesforceConfig};
use pos_crm_sync::logging::init_tracing;
use pos_crm_sync::pipeline::{Pipeline, RunLog, RunSummary};
use pos_crm_sync::types::{DateWindow, SyncError};
use std::io;
use std::process;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();
    let args = cli::parse_args();

    if let Err(e) = run(&args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(args: &CliArgs) -> Result<(), SyncError> {
    let config = args.to_config();
    let started_at = Local::now().naive_local();
    let pipeline = Pipeline::new(&config);
    let window = pipeline.resolve_window(started_at.date())?;

    if !args.yes {
        let confirmed = cli::confirm(
            &window,
            config.mode,
            &mut io::stdin().lock(),
            &mut io::stdout(),
        )?;
        if !confirmed {
            info!("Run declined at prompt");
            return Ok(());
        }
    }

    let mut log = pipeline.open_log(&window, started_at)?;
    let result = execute(args, &config, &pipeline, window, started_at, &mut log).await;
    if let Err(e) = &result {
        log.fatal(e);
    }
    result.map(|_| ())
}

async fn execute(
    args: &CliArgs,
    config: &SyncConfig,
    pipeline: &Pipeline<'_>,
    window: DateWindow,
    started_at: NaiveDateTime,
    log: &mut RunLog,
) -> Result<RunSummary, SyncError> {
    if config.dry_run {
        let crm = InMemoryCrm::dry_run(&config.record_type_name, &config.organization_name);
        return pipeline.run(window, started_at, &crm, log).await;
    }

    load_dotenv(config.mode);
    let credentials = Credentials::from_env()?;
    let mut sf_config =
        SalesforceConfig::for_mode(config.mode).with_timeout(args.request_timeout());
    if let Some(url) = login_url_override() {
        sf_config = sf_config.with_login_url(url);
    }
    let crm = SalesforceClient::login(&sf_config, &credentials).await?;
    pipeline.run(window, started_at, &crm, log).await
}
