//! Core transformation module
//!
//! This module contains the pure transformation components:
//! - `naming` - Display names for donation/shipment records
//! - `transactions` - Payment/order join and opportunity staging
//! - `customers` - Join-date window filter and contact staging
//! - `stage` - Runs both pipelines over a loaded export

pub mod customers;
pub mod naming;
pub mod stage;
pub mod transactions;

pub use customers::stage_customers;
pub use stage::{stage, StagedRecords};
pub use transactions::{join_payments, stage_transactions, CrmIds};
