//! Point-of-sale export rows
//!
//! These types mirror the columns of the three files the POS terminal exports.
//! Only the columns the sync consumes are modelled; address, employee, tender and
//! marketing columns are present in the files but ignored during deserialization.
//!
//! Empty cells deserialize to empty strings, so a missing value never needs a
//! separate `None` case downstream.

use serde::Deserialize;

/// One row of `orders.csv`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Order {
    /// Join key shared with payments
    #[serde(rename = "Order ID")]
    pub order_id: String,

    /// Customer attached to the order at the terminal (often blank)
    #[serde(rename = "Customer Name", default)]
    pub customer_name: String,
}

impl Order {
    /// Columns that must be present in the orders header
    pub const COLUMNS: &'static [&'static str] = &["Order ID", "Customer Name"];
}

/// One row of `payments.csv`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Payment {
    /// Order this payment settles
    #[serde(rename = "Order ID")]
    pub order_id: String,

    /// Timestamp in the POS layout, e.g. `05-Mar-2024 02:15 PM EST`
    #[serde(rename = "Payment Date")]
    pub payment_date: String,

    /// Amount exactly as exported
    ///
    /// Kept as text: the display name is built from the raw digits and the
    /// numeric value is only parsed when the record is submitted.
    #[serde(rename = "Amount")]
    pub amount: String,

    /// Free-text note; carries the CRIDs of the shipment
    #[serde(rename = "Note", default)]
    pub note: String,

    /// Settlement state, becomes the opportunity stage
    #[serde(rename = "Order Payment State", default)]
    pub payment_state: String,
}

impl Payment {
    /// Columns that must be present in the payments header
    pub const COLUMNS: &'static [&'static str] = &[
        "Order ID",
        "Payment Date",
        "Amount",
        "Note",
        "Order Payment State",
    ];
}

/// One row of `customers.csv`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Customer {
    #[serde(rename = "Customer Since", default)]
    pub customer_since: String,

    #[serde(rename = "First Name", default)]
    pub first_name: String,

    #[serde(rename = "Last Name", default)]
    pub last_name: String,

    #[serde(rename = "Phone", default)]
    pub phone: String,

    #[serde(rename = "Email", default)]
    pub email: String,
}

impl Customer {
    /// Columns that must be present in the customers header
    pub const COLUMNS: &'static [&'static str] = &[
        "Customer Since",
        "First Name",
        "Last Name",
        "Phone",
        "Email",
    ];

    /// First and last name joined for log lines
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
