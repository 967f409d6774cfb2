//! Staging of a whole export
//!
//! Both pipelines are pure functions of the loaded export, the CRM ids and
//! the run window. Staging finishes completely before the first create call,
//! so a fatal transform error never leaves a run half-submitted.

use crate::core::customers::stage_customers;
use crate::core::transactions::{stage_transactions, CrmIds};
use crate::io::PosExport;
use crate::types::{Contact, DateWindow, Opportunity, SyncError};

/// Records ready for submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedRecords {
    pub transactions: Vec<Opportunity>,
    pub contacts: Vec<Contact>,
}

/// Run both pipelines over `export`
pub fn stage(
    export: &PosExport,
    ids: &CrmIds,
    window: &DateWindow,
) -> Result<StagedRecords, SyncError> {
    Ok(StagedRecords {
        transactions: stage_transactions(&export.payments, &export.orders, ids)?,
        contacts: stage_customers(&export.customers, window, &ids.organization_id)?,
    })
}
