//! Per-record outcomes and run totals

use crate::crm::{CrmError, RecordId};
use crate::types::PayloadError;

/// What happened to one staged record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Created with the given id
    Inserted(RecordId),
    /// Refused locally or by the CRM
    Rejected(String),
    /// No answer from the CRM
    Failed(String),
}

impl From<CrmError> for RecordOutcome {
    fn from(error: CrmError) -> Self {
        if error.is_transport() {
            RecordOutcome::Failed(error.to_string())
        } else {
            RecordOutcome::Rejected(error.to_string())
        }
    }
}

impl From<PayloadError> for RecordOutcome {
    fn from(error: PayloadError) -> Self {
        RecordOutcome::Rejected(error.to_string())
    }
}

/// Tally for one record kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub written: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl OutcomeCounts {
    pub fn record(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Inserted(_) => self.written += 1,
            RecordOutcome::Rejected(_) => self.rejected += 1,
            RecordOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Records not written, whatever the reason
    pub fn skipped(&self) -> usize {
        self.rejected + self.failed
    }

    pub fn total(&self) -> usize {
        self.written + self.skipped()
    }
}

/// Totals of a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub transactions: OutcomeCounts,
    pub customers: OutcomeCounts,
}
