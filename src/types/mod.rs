//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `pos`: Rows of the point-of-sale export files
//! - `crm_record`: Staged records and submission payloads for the CRM
//! - `dates`: Date layouts and the inclusive run window
//! - `error`: Fatal error type for a sync run

pub mod crm_record;
pub mod dates;
pub mod error;
pub mod pos;

pub use crm_record::{Contact, Opportunity, OpportunityPayload, PayloadError};
pub use dates::DateWindow;
pub use error::SyncError;
pub use pos::{Customer, Order, Payment};
