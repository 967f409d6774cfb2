//! Watermark store
//!
//! Persists the end date of the last successful run in a one-line file so the
//! next run can start where this one stopped.
//!
//! ```text
//! 03-10-2024
//! ```
//!
//! A missing file is a cold start, not an error: the window then opens
//! `default_days` before today. A file that exists but does not hold a valid
//! `MM-DD-YYYY` date is fatal, since guessing would either skip or replay data.

use crate::types::dates::{format_mdy, parse_mdy};
use crate::types::SyncError;
use chrono::{Days, NaiveDate};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default watermark file name
pub const WATERMARK_FILE: &str = "last_run.txt";

/// Days covered by the window when no watermark exists
pub const DEFAULT_WINDOW_DAYS: u64 = 7;

/// File-backed store for the last processed date
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last recorded end date, or `None` on a cold start
    pub fn last_end(&self) -> Result<Option<NaiveDate>, SyncError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        parse_mdy(content.trim())
            .map(Some)
            .map_err(|_| SyncError::CorruptWatermark {
                path: self.path.display().to_string(),
                content: content.trim().to_string(),
            })
    }

    /// Start of the next window
    ///
    /// # Returns
    ///
    /// * The day after the recorded end date, if a watermark exists
    /// * `today - default_days` otherwise
    pub fn read(&self, today: NaiveDate, default_days: u64) -> Result<NaiveDate, SyncError> {
        match self.last_end()? {
            Some(end) => {
                let start = end.succ_opt().unwrap_or(end);
                debug!(path = %self.path.display(), last_end = %end, %start, "Watermark found");
                Ok(start)
            }
            None => {
                let start = today
                    .checked_sub_days(Days::new(default_days))
                    .unwrap_or(NaiveDate::MIN);
                info!(
                    path = %self.path.display(),
                    default_days,
                    %start,
                    "No watermark, using default window"
                );
                Ok(start)
            }
        }
    }

    /// Overwrite the watermark with `end`
    pub fn write(&self, end: NaiveDate) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, format!("{}\n", format_mdy(end)))?;
        info!(path = %self.path.display(), end = %format_mdy(end), "Watermark updated");
        Ok(())
    }
}
