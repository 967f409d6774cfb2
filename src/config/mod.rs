//! Run configuration
//!
//! Everything a run needs is gathered once at startup into [`SyncConfig`] and
//! [`Credentials`] and then passed by reference; nothing reads globals later.
//!
//! Credentials come from the process environment, optionally seeded from a
//! dotenv file:
//!
//! | Variable       | Required | Meaning                                  |
//! |----------------|----------|------------------------------------------|
//! | `SF_USERNAME`  | yes      | CRM account name                         |
//! | `SF_PASSWORD`  | yes      | CRM account secret                       |
//! | `SF_TOKEN`     | yes      | Security token appended to the secret    |
//! | `SF_LOGIN_URL` | no       | Overrides the login host for the mode    |
//!
//! `.env` is read in production mode and `.env.test` in test mode.

use crate::io::loader::ExportPaths;
use crate::types::dates::format_mdy;
use crate::types::{DateWindow, SyncError};
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::{debug, warn};

pub const USERNAME_VAR: &str = "SF_USERNAME";
pub const PASSWORD_VAR: &str = "SF_PASSWORD";
pub const TOKEN_VAR: &str = "SF_TOKEN";
pub const LOGIN_URL_VAR: &str = "SF_LOGIN_URL";

/// Record type every opportunity is created with
pub const DEFAULT_RECORD_TYPE: &str = "Item Shipment";

/// Organization every record is attached to
pub const DEFAULT_ORGANIZATION: &str = "Curbside Sales (Outgoing)";

/// Which CRM instance a run targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Test,
    Production,
}

impl Mode {
    pub fn from_test_flag(test: bool) -> Self {
        if test {
            Mode::Test
        } else {
            Mode::Production
        }
    }

    /// Tag written at the head of each run-log block
    pub fn tag(self) -> &'static str {
        match self {
            Mode::Test => "TEST",
            Mode::Production => "PROD",
        }
    }

    /// Dotenv file holding this mode's credentials
    pub fn dotenv_file(self) -> &'static str {
        match self {
            Mode::Test => ".env.test",
            Mode::Production => ".env",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Test => write!(f, "test"),
            Mode::Production => write!(f, "prod"),
        }
    }
}

/// Settings for one sync run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub mode: Mode,
    /// Submit to the in-memory CRM and leave the watermark alone
    pub dry_run: bool,
    /// Explicit window start; the watermark decides when absent
    pub start_date: Option<NaiveDate>,
    /// Explicit window end; today when absent
    pub end_date: Option<NaiveDate>,
    /// Directory holding the three export files
    pub data_dir: PathBuf,
    /// Root of the per-run archive
    pub history_dir: PathBuf,
    /// Append-only run log
    pub log_file: PathBuf,
    pub watermark_file: PathBuf,
    /// Window length on a cold start
    pub default_window_days: u64,
    pub record_type_name: String,
    pub organization_name: String,
}

impl SyncConfig {
    pub fn export_paths(&self) -> ExportPaths {
        ExportPaths::in_dir(&self.data_dir)
    }

    /// Window end: the explicit end date or `today`
    pub fn window_end(&self, today: NaiveDate) -> NaiveDate {
        self.end_date.unwrap_or(today)
    }

    /// Window for a start date the caller already resolved
    pub fn window_from(&self, start: NaiveDate, today: NaiveDate) -> DateWindow {
        let window = DateWindow::new(start, self.window_end(today));
        if window.is_empty() {
            warn!(
                start = %format_mdy(window.start),
                end = %format_mdy(window.end),
                "Window start is after its end; no customers will be selected"
            );
        }
        window
    }
}

/// Login credentials for the CRM
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub security_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("security_token", &"***")
            .finish()
    }
}

impl Credentials {
    /// Build credentials from any key lookup
    ///
    /// # Errors
    ///
    /// `SyncError::MissingCredential` naming the first absent or empty variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| SyncError::missing_credential(name))
        };

        Ok(Credentials {
            username: require(USERNAME_VAR)?,
            password: require(PASSWORD_VAR)?,
            security_token: require(TOKEN_VAR)?,
        })
    }

    /// Build credentials from the process environment
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

/// Seed the process environment from the mode's dotenv file
///
/// A missing dotenv file is fine; variables may already be exported.
pub fn load_dotenv(mode: Mode) {
    match dotenvy::from_filename(mode.dotenv_file()) {
        Ok(path) => debug!(path = %path.display(), "Loaded dotenv file"),
        Err(e) if e.not_found() => {
            debug!(file = mode.dotenv_file(), "No dotenv file, using process environment")
        }
        Err(e) => warn!(file = mode.dotenv_file(), error = %e, "Failed to read dotenv file"),
    }
}

/// Login host override from the environment
pub fn login_url_override() -> Option<String> {
    std::env::var(LOGIN_URL_VAR).ok().filter(|url| !url.is_empty())
}
