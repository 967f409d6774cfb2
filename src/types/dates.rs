//! Date handling shared by the CLI, the watermark and the transformer
//!
//! Three textual layouts are in play:
//! - `MM-DD-YYYY` for CLI arguments and the watermark file
//! - `DD-Mon-YYYY HH:MM AM/PM TZ` for POS timestamps (payment date, join date)
//! - `MM/DD/YYYY` in derived display names

use crate::types::SyncError;
use chrono::{NaiveDate, NaiveDateTime};

/// Layout of CLI dates and the watermark file
pub const DATE_FORMAT: &str = "%m-%d-%Y";

/// Layout of POS timestamps once the trailing time zone token is removed
const POS_TIMESTAMP_FORMAT: &str = "%d-%b-%Y %I:%M %p";

/// Parse a strict `MM-DD-YYYY` date
///
/// The shape is checked before parsing: chrono alone would accept
/// single-digit months and days.
pub fn parse_mdy(value: &str) -> Result<NaiveDate, SyncError> {
    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes[2] == b'-'
        && bytes[5] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || i == 5 || b.is_ascii_digit());

    if !well_formed {
        return Err(SyncError::invalid_date(value));
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| SyncError::invalid_date(value))
}

/// Format a date as `MM-DD-YYYY`
pub fn format_mdy(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a POS timestamp such as `05-Mar-2024 02:15 PM EST`
///
/// The zone abbreviation must be present but is not interpreted; the result
/// is the wall-clock time at the terminal.
pub fn parse_pos_timestamp(value: &str) -> Option<NaiveDateTime> {
    let (stamp, zone) = value.trim().rsplit_once(' ')?;
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    NaiveDateTime::parse_from_str(stamp, POS_TIMESTAMP_FORMAT).ok()
}

/// Inclusive date range selecting which customers a run picks up
///
/// A window whose start lies after its end is valid and matches nothing; this
/// is what a second run on the same day sees after the watermark advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether `date` falls within `[start, end]`
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", format_mdy(self.start), format_mdy(self.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case("03-05-2024", date(2024, 3, 5))]
    #[case("12-31-1999", date(1999, 12, 31))]
    #[case("02-29-2024", date(2024, 2, 29))]
    fn test_parse_mdy_valid(#[case] input: &str, #[case] expected: NaiveDate) {
        assert_eq!(parse_mdy(input).unwrap(), expected);
    }

    #[rstest]
    #[case::single_digit_month("3-05-2024")]
    #[case::iso("2024-03-05")]
    #[case::slashes("03/05/2024")]
    #[case::not_a_day("02-30-2024")]
    #[case::trailing("03-05-20245")]
    #[case::empty("")]
    fn test_parse_mdy_rejects(#[case] input: &str) {
        assert_eq!(parse_mdy(input), Err(SyncError::invalid_date(input)));
    }

    #[test]
    fn test_format_mdy_is_fixed_width() {
        assert_eq!(format_mdy(date(2024, 1, 2)), "01-02-2024");
    }

    #[rstest]
    #[case("05-Mar-2024 02:15 PM EST", "2024-03-05T14:15:00")]
    #[case("31-Dec-2023 12:00 AM UTC", "2023-12-31T00:00:00")]
    #[case("  01-Jan-2024 09:30 AM PST ", "2024-01-01T09:30:00")]
    fn test_parse_pos_timestamp(#[case] input: &str, #[case] expected: &str) {
        let parsed = parse_pos_timestamp(input).unwrap();
        assert_eq!(parsed.format("%Y-%m-%dT%H:%M:%S").to_string(), expected);
    }

    #[rstest]
    #[case::missing_zone("05-Mar-2024 02:15 PM")]
    #[case::numeric_month("05-03-2024 02:15 PM EST")]
    #[case::garbage("yesterday")]
    fn test_parse_pos_timestamp_rejects(#[case] input: &str) {
        assert!(parse_pos_timestamp(input).is_none());
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = DateWindow::new(date(2024, 3, 1), date(2024, 3, 10));
        assert!(window.contains(date(2024, 3, 1)));
        assert!(window.contains(date(2024, 3, 10)));
        assert!(!window.contains(date(2024, 2, 29)));
        assert!(!window.contains(date(2024, 3, 11)));
    }

    #[test]
    fn test_inverted_window_is_empty() {
        let window = DateWindow::new(date(2024, 3, 11), date(2024, 3, 10));
        assert!(window.is_empty());
        assert!(!window.contains(date(2024, 3, 10)));
        assert!(!window.contains(date(2024, 3, 11)));
    }

    #[test]
    fn test_window_display() {
        let window = DateWindow::new(date(2024, 3, 1), date(2024, 3, 10));
        assert_eq!(window.to_string(), "03-01-2024 - 03-10-2024");
    }
}
