//! I/O module
//!
//! Handles every file the sync touches.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (header validation, row decoding, staged output)
//! - `loader` - Reads the three POS export files
//! - `watermark` - Persists the end date of the last run

pub mod csv_format;
pub mod loader;
pub mod watermark;

pub use csv_format::{check_headers, read_rows, read_rows_from, write_staged_csv};
pub use loader::{ExportPaths, PosExport};
pub use watermark::WatermarkStore;
