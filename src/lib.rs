//! POS to CRM Sync Library
//! # Overview
//!
//! This library moves new activity from a point-of-sale export into a CRM,
//! one incremental run at a time: payments become opportunities and newly
//! joined customers become contacts.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (export rows, staged CRM records, errors)
//! - [`cli`] - CLI arguments parsing and the confirmation prompt
//! - [`config`] - Run configuration and credentials
//! - [`io`] - Export loading, CSV handling and the watermark file
//! - [`core`] - Pure transformation components:
//!   - [`core::transactions`] - Payment/order join and opportunity staging
//!   - [`core::customers`] - Join-date window filter and contact staging
//!   - [`core::naming`] - Display names for staged opportunities
//! - [`crm`] - CRM client trait with live and in-memory implementations
//! - [`pipeline`] - Run orchestration, run log and archive
//!
//! # Run Semantics
//!
//! - Transactions are not filtered by date: every payment with a matching
//!   order is submitted on every run
//! - Customers are selected by join date, inclusive on both window ends
//! - Each record is its own create call; a failed record is logged and
//!   skipped without stopping the run
//! - The watermark records the window end only after a completed run

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod crm;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod types;

pub use config::{Credentials, Mode, SyncConfig};
pub use crm::{CrmClient, CrmError, InMemoryCrm, SalesforceClient};
pub use pipeline::{Pipeline, RunLog, RunSummary};
pub use types::{Contact, DateWindow, Opportunity, SyncError};
