//! CRM client adapter
//!
//! The sync needs four things from the CRM: two name lookups before staging
//! and two create operations during submission. [`CrmClient`] captures exactly
//! those, so the pipeline runs unchanged against the live [`SalesforceClient`]
//! or the [`InMemoryCrm`] used for dry runs and tests.
//!
//! Every create call is independent: there is no batching, no transaction and
//! no retry. A failed create is returned as a typed [`CrmError`] so the caller
//! can tell a rejected record apart from a broken connection.

pub mod memory;
pub mod salesforce;

pub use memory::InMemoryCrm;
pub use salesforce::{SalesforceClient, SalesforceConfig};

use crate::types::{Contact, OpportunityPayload};
use async_trait::async_trait;
use thiserror::Error;

/// Object holding opportunity record types
pub const RECORD_TYPE_OBJECT: &str = "RecordType";

/// Object holding organizations
pub const ACCOUNT_OBJECT: &str = "Account";

/// Identifier the CRM assigns to a created record
pub type RecordId = String;

/// Failure of a single CRM call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrmError {
    /// Login refused or session no longer valid
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// The CRM answered and refused the request (validation, permissions, ...)
    #[error("rejected with status {status}: {reason}")]
    Rejected { status: u16, reason: String },

    /// The request never got an answer (connection, timeout, TLS)
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The CRM answered with something that could not be understood
    #[error("unexpected response: {message}")]
    Decode { message: String },
}

impl CrmError {
    /// Whether the failure happened below the CRM's own validation
    pub fn is_transport(&self) -> bool {
        matches!(self, CrmError::Transport { .. })
    }
}

// Conversion from reqwest::Error to CrmError
impl From<reqwest::Error> for CrmError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            CrmError::Decode {
                message: error.to_string(),
            }
        } else {
            CrmError::Transport {
                message: error.to_string(),
            }
        }
    }
}

/// Remote operations the sync depends on
#[async_trait]
pub trait CrmClient: Send + Sync {
    /// Id of the first `object` record whose `Name` equals `name`
    ///
    /// Returns `Ok(None)` when nothing matches.
    async fn lookup_id(&self, object: &str, name: &str) -> Result<Option<RecordId>, CrmError>;

    /// Create one opportunity
    async fn create_opportunity(
        &self,
        payload: &OpportunityPayload,
    ) -> Result<RecordId, CrmError>;

    /// Create one contact
    async fn create_contact(&self, contact: &Contact) -> Result<RecordId, CrmError>;
}
