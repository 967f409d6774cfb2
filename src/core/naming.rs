//! Display names for donation/shipment records
//!
//! Every opportunity is named after who paid, which shipments the payment
//! covers, when it happened and how much it was:
//!
//! ```text
//! Jane Doe - Shipment CRID(s): 123, 456 03/05/2024 = $12.50
//! ```

use chrono::NaiveDate;

/// Stand-in for a blank customer name
pub const MISSING_NAME: &str = "Missing Info";

/// Stand-in when a note carries no CRID digits
pub const MISSING_CRIDS: &str = "Not Found";

/// Extract the CRID list from a payment note
///
/// Keeps only digits, commas and spaces, then trims the ends.
pub fn crid_list(note: &str) -> String {
    let kept: String = note
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == ' ')
        .collect();

    match kept.trim() {
        "" => MISSING_CRIDS.to_string(),
        crids => crids.to_string(),
    }
}

/// Re-emit the date part of a POS timestamp as `MM/DD/YYYY`
///
/// The timestamp is sliced at fixed offsets (`DD-Mon-YYYY...`): day at 0..2,
/// month abbreviation at 3..6, year at 7..11. Anything else yields `None`.
pub fn name_date(payment_date: &str) -> Option<String> {
    let day = payment_date.get(0..2)?;
    let month = payment_date.get(3..6)?;
    let year = payment_date.get(7..11)?;

    let date = NaiveDate::parse_from_str(&format!("{} {}, {}", month, day, year), "%b %d, %Y")
        .ok()?;
    Some(date.format("%m/%d/%Y").to_string())
}

/// Amount as shown in the name
///
/// The export carries one implied decimal digit, so a literal `0` is appended
/// to the raw text: `12.5` becomes `$12.50`, `100` becomes `$1000`.
pub fn display_amount(amount: &str) -> String {
    format!("${}0", amount)
}

/// Assemble the full display name
///
/// Returns `None` when the payment date does not follow the POS layout.
pub fn display_name(
    customer_name: &str,
    note: &str,
    payment_date: &str,
    amount: &str,
) -> Option<String> {
    let name = if customer_name.is_empty() {
        MISSING_NAME
    } else {
        customer_name
    };

    Some(format!(
        "{} - Shipment CRID(s): {} {} = {}",
        name,
        crid_list(note),
        name_date(payment_date)?,
        display_amount(amount)
    ))
}
