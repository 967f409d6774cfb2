//! In-memory CRM
//!
//! Resolves lookups from a seeded table and records every created payload.
//! Individual records can be set up to be rejected or to fail at transport
//! level, which is how the pipeline's per-record error handling is exercised.
//! `--dry-run` submits against an instance that accepts everything.

use crate::crm::{CrmClient, CrmError, RecordId, ACCOUNT_OBJECT, RECORD_TYPE_OBJECT};
use crate::types::{Contact, OpportunityPayload};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// CRM double backed by in-process state
#[derive(Debug, Default)]
pub struct InMemoryCrm {
    lookups: HashMap<(String, String), RecordId>,
    rejected: HashSet<String>,
    unreachable: HashSet<String>,
    opportunities: Mutex<Vec<OpportunityPayload>>,
    contacts: Mutex<Vec<Contact>>,
    next_id: AtomicU64,
}

impl InMemoryCrm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instance that resolves both run lookups and accepts every record
    pub fn dry_run(record_type_name: &str, organization_name: &str) -> Self {
        Self::new()
            .with_lookup(RECORD_TYPE_OBJECT, record_type_name, "DRY-RUN-RECORD-TYPE")
            .with_lookup(ACCOUNT_OBJECT, organization_name, "DRY-RUN-ORGANIZATION")
    }

    /// Make `lookup_id(object, name)` return `id`
    pub fn with_lookup(mut self, object: &str, name: &str, id: &str) -> Self {
        self.lookups
            .insert((object.to_string(), name.to_string()), id.to_string());
        self
    }

    /// Reject the record identified by `key`
    ///
    /// The key is the opportunity `Name`, or `"First Last"` for contacts.
    pub fn rejecting(mut self, key: &str) -> Self {
        self.rejected.insert(key.to_string());
        self
    }

    /// Fail the record identified by `key` as if the network dropped
    pub fn unreachable_for(mut self, key: &str) -> Self {
        self.unreachable.insert(key.to_string());
        self
    }

    /// Opportunities accepted so far, in submission order
    pub fn opportunities(&self) -> Vec<OpportunityPayload> {
        self.opportunities
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Contacts accepted so far, in submission order
    pub fn contacts(&self) -> Vec<Contact> {
        self.contacts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn check(&self, key: &str) -> Result<(), CrmError> {
        if self.unreachable.contains(key) {
            return Err(CrmError::Transport {
                message: format!("connection reset while creating '{}'", key),
            });
        }
        if self.rejected.contains(key) {
            return Err(CrmError::Rejected {
                status: 400,
                reason: format!("FIELD_CUSTOM_VALIDATION_EXCEPTION: '{}' refused", key),
            });
        }
        Ok(())
    }

    fn next_id(&self, prefix: &str) -> RecordId {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}{:012}", prefix, n)
    }
}

#[async_trait]
impl CrmClient for InMemoryCrm {
    async fn lookup_id(&self, object: &str, name: &str) -> Result<Option<RecordId>, CrmError> {
        Ok(self
            .lookups
            .get(&(object.to_string(), name.to_string()))
            .cloned())
    }

    async fn create_opportunity(
        &self,
        payload: &OpportunityPayload,
    ) -> Result<RecordId, CrmError> {
        self.check(&payload.name)?;
        self.opportunities
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(payload.clone());
        Ok(self.next_id("006"))
    }

    async fn create_contact(&self, contact: &Contact) -> Result<RecordId, CrmError> {
        self.check(&contact.full_name())?;
        self.contacts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(contact.clone());
        Ok(self.next_id("003"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(first: &str) -> Contact {
        Contact {
            first_name: first.to_string(),
            account_id: "001ORG".to_string(),
            last_name: "Doe".to_string(),
            phone: String::new(),
            email: String::new(),
        }
    }

    #[tokio::test]
    async fn test_lookup_uses_seeded_ids() {
        let crm = InMemoryCrm::dry_run("Item Shipment", "Curbside Sales (Outgoing)");

        assert_eq!(
            crm.lookup_id(RECORD_TYPE_OBJECT, "Item Shipment").await.unwrap(),
            Some("DRY-RUN-RECORD-TYPE".to_string())
        );
        assert_eq!(crm.lookup_id(ACCOUNT_OBJECT, "Other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_records_and_assigns_ids() {
        let crm = InMemoryCrm::new();

        let first = crm.create_contact(&contact("Ada")).await.unwrap();
        let second = crm.create_contact(&contact("Bob")).await.unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("003"));
        assert_eq!(crm.contacts().len(), 2);
    }

    #[tokio::test]
    async fn test_configured_failures() {
        let crm = InMemoryCrm::new()
            .rejecting("Ada Doe")
            .unreachable_for("Bob Doe");

        let rejected = crm.create_contact(&contact("Ada")).await.unwrap_err();
        let dropped = crm.create_contact(&contact("Bob")).await.unwrap_err();

        assert!(matches!(rejected, CrmError::Rejected { status: 400, .. }));
        assert!(dropped.is_transport());
        assert!(crm.contacts().is_empty());
    }
}
