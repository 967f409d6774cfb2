//! Error types for the POS to CRM sync
//!
//! This module defines every fatal condition that can abort a sync run.
//! Errors are designed to be descriptive and user-friendly for CLI output.
//!
//! # Error Categories
//!
//! - **File I/O Errors**: Missing export files, unreadable watermark, archive failures
//! - **CSV Errors**: Malformed CSV, missing required columns
//! - **Date Errors**: Malformed CLI dates, corrupt watermark, unparseable POS timestamps
//! - **CRM Errors**: Missing credentials, failed lookups, login failures
//!
//! Per-record create failures are NOT represented here: they are reported as
//! [`crate::crm::CrmError`] values and counted as skipped records by the pipeline.

use crate::crm::CrmError;
use thiserror::Error;

/// Main error type for a sync run
///
/// Every variant is fatal: the run stops and no further remote writes happen.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// Input file not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// A CSV header lacks columns the transformer depends on
    #[error("Schema error in {file}: missing column(s) {}", missing.join(", "))]
    SchemaError {
        /// File whose header failed validation
        file: String,
        /// Every required column absent from the header
        missing: Vec<String>,
    },

    /// A date did not match the expected `MM-DD-YYYY` form
    #[error("Invalid date '{value}': dates must be of the form mm-dd-yyyy")]
    InvalidDate {
        /// The rejected input
        value: String,
    },

    /// The watermark file exists but does not hold a valid date
    #[error("Corrupt watermark file {path}: '{content}'")]
    CorruptWatermark {
        /// Path to the watermark file
        path: String,
        /// Content that failed to parse
        content: String,
    },

    /// A payment date did not match the POS timestamp layout
    #[error("Invalid payment date '{value}' for order {order_id}")]
    InvalidPaymentDate {
        /// The raw payment date
        value: String,
        /// Order the payment belongs to
        order_id: String,
    },

    /// A customer's join date could not be parsed
    #[error("Invalid join date '{value}' for customer {name}")]
    InvalidJoinDate {
        /// The raw join date
        value: String,
        /// First and last name of the customer
        name: String,
    },

    /// A required credential is absent from the environment
    #[error("Missing required environment variable {name}")]
    MissingCredential {
        /// Environment variable name
        name: String,
    },

    /// A name lookup against the CRM returned no records
    #[error("No {object} found named '{name}'")]
    LookupNotFound {
        /// CRM object type that was queried
        object: String,
        /// Name that was looked up
        name: String,
    },

    /// The CRM rejected login or a lookup failed at transport level
    #[error("CRM error: {0}")]
    Crm(#[from] CrmError),
}

// Conversion from io::Error to SyncError
impl From<std::io::Error> for SyncError {
    fn from(error: std::io::Error) -> Self {
        SyncError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to SyncError
impl From<csv::Error> for SyncError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        SyncError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl SyncError {
    /// Create a FileNotFound error
    pub fn file_not_found(path: &std::path::Path) -> Self {
        SyncError::FileNotFound {
            path: path.display().to_string(),
        }
    }

    /// Create a SchemaError error
    pub fn schema(file: &str, missing: Vec<String>) -> Self {
        SyncError::SchemaError {
            file: file.to_string(),
            missing,
        }
    }

    /// Create an InvalidDate error
    pub fn invalid_date(value: &str) -> Self {
        SyncError::InvalidDate {
            value: value.to_string(),
        }
    }

    /// Create a MissingCredential error
    pub fn missing_credential(name: &str) -> Self {
        SyncError::MissingCredential {
            name: name.to_string(),
        }
    }

    /// Create a LookupNotFound error
    pub fn lookup_not_found(object: &str, name: &str) -> Self {
        SyncError::LookupNotFound {
            object: object.to_string(),
            name: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::Path;

    #[rstest]
    #[case::file_not_found(
        SyncError::FileNotFound { path: "orders.csv".to_string() },
        "File not found: orders.csv"
    )]
    #[case::io_error(
        SyncError::IoError { message: "Permission denied".to_string() },
        "I/O error: Permission denied"
    )]
    #[case::parse_error_with_line(
        SyncError::ParseError { line: Some(42), message: "Invalid field".to_string() },
        "CSV parse error at line 42: Invalid field"
    )]
    #[case::parse_error_without_line(
        SyncError::ParseError { line: None, message: "Invalid field".to_string() },
        "CSV parse error: Invalid field"
    )]
    #[case::schema_error(
        SyncError::schema("customers.csv", vec!["Phone".to_string(), "Email".to_string()]),
        "Schema error in customers.csv: missing column(s) Phone, Email"
    )]
    #[case::invalid_date(
        SyncError::invalid_date("2024-01-01"),
        "Invalid date '2024-01-01': dates must be of the form mm-dd-yyyy"
    )]
    #[case::missing_credential(
        SyncError::missing_credential("SF_TOKEN"),
        "Missing required environment variable SF_TOKEN"
    )]
    #[case::lookup_not_found(
        SyncError::lookup_not_found("RecordType", "Item Shipment"),
        "No RecordType found named 'Item Shipment'"
    )]
    fn test_error_display(#[case] error: SyncError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_file_not_found_helper() {
        let error = SyncError::file_not_found(Path::new("data/payments.csv"));
        assert_eq!(
            error,
            SyncError::FileNotFound {
                path: "data/payments.csv".to_string()
            }
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: SyncError = io_error.into();
        assert!(matches!(error, SyncError::IoError { .. }));
        assert_eq!(error.to_string(), "I/O error: Permission denied");
    }

    #[test]
    fn test_crm_error_conversion() {
        let error: SyncError = CrmError::Auth {
            message: "INVALID_LOGIN".to_string(),
        }
        .into();
        assert_eq!(error.to_string(), "CRM error: authentication failed: INVALID_LOGIN");
    }
}
