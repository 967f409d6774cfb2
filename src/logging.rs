//! Diagnostic logging setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter
pub const LOG_FILTER_VAR: &str = "POS_CRM_SYNC_LOG";

/// Initialize tracing with the `POS_CRM_SYNC_LOG` filter
///
/// Defaults to "info" when the variable is unset or invalid. Events go to
/// stderr so they never interleave with the confirmation prompt.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_FILTER_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
