//! CRM-side record types
//!
//! `Opportunity` and `Contact` are the staged rows produced by the transformer.
//! They serialize with the CRM's field names so the same struct feeds both the
//! archived `actual/*.csv` tables and the create calls.

use crate::types::dates::parse_pos_timestamp;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

/// A staged donation/shipment record, one per joined payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Opportunity {
    #[serde(rename = "RecordTypeId")]
    pub record_type_id: String,

    #[serde(rename = "AccountId")]
    pub account_id: String,

    #[serde(rename = "Site_Served__c")]
    pub site_served: String,

    /// Derived display name, see [`crate::core::naming`]
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "StageName")]
    pub stage_name: String,

    /// Payment timestamp still in the POS layout
    #[serde(rename = "CloseDate")]
    pub close_date: String,

    /// Amount text as exported
    #[serde(rename = "Amount")]
    pub amount: String,
}

impl Opportunity {
    /// Column order of the staged transactions table
    pub const COLUMNS: &'static [&'static str] = &[
        "RecordTypeId",
        "AccountId",
        "Site_Served__c",
        "Name",
        "StageName",
        "CloseDate",
        "Amount",
    ];
}

/// A staged contact, one per customer inside the window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    #[serde(rename = "FirstName")]
    pub first_name: String,

    #[serde(rename = "AccountId")]
    pub account_id: String,

    #[serde(rename = "LastName")]
    pub last_name: String,

    #[serde(rename = "Phone")]
    pub phone: String,

    #[serde(rename = "Email")]
    pub email: String,
}

impl Contact {
    /// Column order of the staged contacts table
    pub const COLUMNS: &'static [&'static str] =
        &["FirstName", "AccountId", "LastName", "Phone", "Email"];

    /// First and last name joined for log lines
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Opportunity as submitted to the CRM
///
/// Built from a staged [`Opportunity`] right before its create call. A record
/// whose close date or amount cannot be normalized is skipped, not fatal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpportunityPayload {
    #[serde(rename = "RecordTypeId")]
    pub record_type_id: String,

    #[serde(rename = "AccountId")]
    pub account_id: String,

    #[serde(rename = "Site_Served__c")]
    pub site_served: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "StageName")]
    pub stage_name: String,

    /// ISO-8601 local date-time, `YYYY-MM-DDTHH:MM:SS`
    #[serde(rename = "CloseDate")]
    pub close_date: String,

    #[serde(rename = "Amount", with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// Why a staged opportunity could not be turned into a payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("time data '{0}' does not match format 'DD-Mon-YYYY HH:MM AM/PM TZ'")]
    InvalidCloseDate(String),

    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
}

impl TryFrom<&Opportunity> for OpportunityPayload {
    type Error = PayloadError;

    fn try_from(staged: &Opportunity) -> Result<Self, Self::Error> {
        let close_date = parse_pos_timestamp(&staged.close_date)
            .ok_or_else(|| PayloadError::InvalidCloseDate(staged.close_date.clone()))?;

        let amount = Decimal::from_str(staged.amount.trim())
            .map_err(|_| PayloadError::InvalidAmount(staged.amount.clone()))?;

        Ok(OpportunityPayload {
            record_type_id: staged.record_type_id.clone(),
            account_id: staged.account_id.clone(),
            site_served: staged.site_served.clone(),
            name: staged.name.clone(),
            stage_name: staged.stage_name.clone(),
            close_date: close_date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            amount,
        })
    }
}
