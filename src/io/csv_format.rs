//! CSV format handling for POS exports and staged output
//!
//! This module centralizes all CSV format concerns, providing:
//! - Header validation against the columns a row type requires
//! - Typed deserialization of a whole export file
//! - Serialization of staged CRM tables for the run archive
//!
//! Columns are matched by name, never by position, so a reordered export is
//! still read correctly and a renamed column fails fast with a schema error.

use crate::types::SyncError;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

/// Verify that every required column appears in a header row
///
/// # Arguments
///
/// * `file` - File name used in the error message
/// * `headers` - Header row as read from the file
/// * `required` - Column names the row type deserializes
///
/// # Returns
///
/// * `Ok(())` if all required columns are present
/// * `Err(SyncError::SchemaError)` listing every missing column, in `required` order
pub fn check_headers(
    file: &str,
    headers: &StringRecord,
    required: &[&str],
) -> Result<(), SyncError> {
    let present: Vec<&str> = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim())
        .collect();

    let missing: Vec<String> = required
        .iter()
        .filter(|column| !present.contains(*column))
        .map(|column| column.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SyncError::schema(file, missing))
    }
}

/// Read every row of an export from any reader
///
/// The header is validated before the first row is deserialized. Any row
/// that fails to deserialize aborts the read: a partially loaded export is
/// never handed to the transformer.
pub fn read_rows_from<T, R>(file: &str, input: R, required: &[&str]) -> Result<Vec<T>, SyncError>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .buffer_capacity(8 * 1024)
        .from_reader(input);

    let mut headers = reader.headers()?.clone();
    check_headers(file, &headers, required)?;

    // Normalize a leading byte-order mark so serde sees the bare column name
    headers = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim())
        .collect();
    reader.set_headers(headers);

    reader
        .deserialize::<T>()
        .map(|row| row.map_err(SyncError::from))
        .collect()
}

/// Read every row of an export file
///
/// # Errors
///
/// * `SyncError::FileNotFound` if the file does not exist
/// * `SyncError::SchemaError` if required columns are missing
/// * `SyncError::ParseError` if a row is malformed
pub fn read_rows<T: DeserializeOwned>(path: &Path, required: &[&str]) -> Result<Vec<T>, SyncError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SyncError::file_not_found(path),
        _ => SyncError::IoError {
            message: format!("Failed to open file '{}': {}", path.display(), e),
        },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    read_rows_from(&name, file, required)
}

/// Write a staged table to CSV format
///
/// The header row is always written, so an empty table still produces a
/// file naming its columns.
///
/// # Arguments
///
/// * `header` - Column names, in the order the row type serializes its fields
/// * `rows` - Staged records
/// * `output` - Destination writer
pub fn write_staged_csv<T: Serialize>(
    header: &[&str],
    rows: &[T],
    output: &mut dyn Write,
) -> Result<(), SyncError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(output);

    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer.flush()?;
    Ok(())
}
