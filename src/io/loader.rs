//! Loader for the three POS export files
//!
//! The files live side by side in one directory under fixed names. All three
//! are read before anything else happens; if any one is missing or malformed
//! the run fails without processing the others.

use crate::io::csv_format::read_rows;
use crate::types::{Customer, Order, Payment, SyncError};
use std::path::{Path, PathBuf};
use tracing::info;

/// Orders export file name
pub const ORDERS_CSV_FILE: &str = "orders.csv";
/// Payments export file name
pub const PAYMENTS_CSV_FILE: &str = "payments.csv";
/// Customers export file name
pub const CUSTOMERS_CSV_FILE: &str = "customers.csv";

/// Paths of the three export files inside a data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub orders: PathBuf,
    pub payments: PathBuf,
    pub customers: PathBuf,
}

impl ExportPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            orders: dir.join(ORDERS_CSV_FILE),
            payments: dir.join(PAYMENTS_CSV_FILE),
            customers: dir.join(CUSTOMERS_CSV_FILE),
        }
    }

    /// `(file name, path)` pairs, in archive order
    pub fn entries(&self) -> [(&'static str, &Path); 3] {
        [
            (ORDERS_CSV_FILE, self.orders.as_path()),
            (PAYMENTS_CSV_FILE, self.payments.as_path()),
            (CUSTOMERS_CSV_FILE, self.customers.as_path()),
        ]
    }
}

/// Typed contents of one POS export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PosExport {
    pub orders: Vec<Order>,
    pub payments: Vec<Payment>,
    pub customers: Vec<Customer>,
}

impl PosExport {
    /// Load all three export files
    ///
    /// Presence of every file is checked up front so a missing customers file
    /// is reported even when orders are also broken.
    ///
    /// # Errors
    ///
    /// * `SyncError::FileNotFound` for the first absent file
    /// * `SyncError::SchemaError` / `SyncError::ParseError` for malformed content
    pub fn load(paths: &ExportPaths) -> Result<Self, SyncError> {
        if let Some((_, missing)) = paths.entries().into_iter().find(|(_, p)| !p.exists()) {
            return Err(SyncError::file_not_found(missing));
        }

        let export = PosExport {
            orders: read_rows(&paths.orders, Order::COLUMNS)?,
            payments: read_rows(&paths.payments, Payment::COLUMNS)?,
            customers: read_rows(&paths.customers, Customer::COLUMNS)?,
        };

        info!(
            orders = export.orders.len(),
            payments = export.payments.len(),
            customers = export.customers.len(),
            "CSV files loaded"
        );

        Ok(export)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const ORDERS: &str = "Order ID,Customer Name,Order Total\nO1,Jane Doe,12.5\n";
    const PAYMENTS: &str = "Order ID,Payment Date,Amount,Note,Order Payment State\n\
                            O1,05-Mar-2024 02:15 PM EST,12.5,CRID 123,Paid\n";
    const CUSTOMERS: &str = "Customer Since,First Name,Last Name,Phone,Email\n\
                             05-Mar-2024 02:15 PM EST,Jane,Doe,555-0100,jane@example.com\n";

    fn write_export(dir: &Path, files: &[(&str, &str)]) {
        for (name, content) in files {
            fs::write(dir.join(name), content).expect("Failed to write fixture");
        }
    }

    #[test]
    fn test_load_reads_all_three_files() {
        let dir = TempDir::new().unwrap();
        write_export(
            dir.path(),
            &[
                (ORDERS_CSV_FILE, ORDERS),
                (PAYMENTS_CSV_FILE, PAYMENTS),
                (CUSTOMERS_CSV_FILE, CUSTOMERS),
            ],
        );

        let export = PosExport::load(&ExportPaths::in_dir(dir.path())).unwrap();

        assert_eq!(export.orders.len(), 1);
        assert_eq!(export.orders[0].customer_name, "Jane Doe");
        assert_eq!(export.payments.len(), 1);
        assert_eq!(export.customers.len(), 1);
        assert_eq!(export.customers[0].email, "jane@example.com");
    }

    #[test]
    fn test_load_fails_when_any_file_is_missing() {
        let dir = TempDir::new().unwrap();
        write_export(
            dir.path(),
            &[(ORDERS_CSV_FILE, ORDERS), (PAYMENTS_CSV_FILE, PAYMENTS)],
        );

        let paths = ExportPaths::in_dir(dir.path());
        let result = PosExport::load(&paths);

        assert_eq!(result, Err(SyncError::file_not_found(&paths.customers)));
    }

    #[test]
    fn test_load_fails_on_schema_error() {
        let dir = TempDir::new().unwrap();
        write_export(
            dir.path(),
            &[
                (ORDERS_CSV_FILE, ORDERS),
                (PAYMENTS_CSV_FILE, PAYMENTS),
                (CUSTOMERS_CSV_FILE, "First Name,Last Name,Phone,Email\nJane,Doe,,\n"),
            ],
        );

        let result = PosExport::load(&ExportPaths::in_dir(dir.path()));

        assert_eq!(
            result,
            Err(SyncError::schema(
                CUSTOMERS_CSV_FILE,
                vec!["Customer Since".to_string()]
            ))
        );
    }
}
