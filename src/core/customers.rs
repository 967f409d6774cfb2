//! Customer pipeline
//!
//! Selects customers who joined inside the run window and maps them onto CRM
//! contacts attached to the organization.

use crate::types::dates::parse_pos_timestamp;
use crate::types::{Contact, Customer, DateWindow, SyncError};
use chrono::NaiveDate;
use tracing::debug;

// Plain-date layouts seen in customer exports besides the POS timestamp
const JOIN_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%m-%d-%Y", "%d-%b-%Y"];

/// Parse a `Customer Since` value into a calendar date
pub fn parse_join_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Some(timestamp) = parse_pos_timestamp(value) {
        return Some(timestamp.date());
    }

    JOIN_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Map a customer onto a contact for `organization_id`
pub fn to_contact(customer: &Customer, organization_id: &str) -> Contact {
    Contact {
        first_name: customer.first_name.clone(),
        account_id: organization_id.to_string(),
        last_name: customer.last_name.clone(),
        phone: customer.phone.clone(),
        email: customer.email.clone(),
    }
}

/// Run the customer pipeline
///
/// A blank join date never matches the window. A join date that is present
/// but unreadable aborts the run.
///
/// # Errors
///
/// `SyncError::InvalidJoinDate` naming the customer and the raw value.
pub fn stage_customers(
    customers: &[Customer],
    window: &DateWindow,
    organization_id: &str,
) -> Result<Vec<Contact>, SyncError> {
    let mut contacts = Vec::new();

    for customer in customers {
        if customer.customer_since.is_empty() {
            continue;
        }

        let joined = parse_join_date(&customer.customer_since).ok_or_else(|| {
            SyncError::InvalidJoinDate {
                value: customer.customer_since.clone(),
                name: customer.full_name(),
            }
        })?;

        if window.contains(joined) {
            contacts.push(to_contact(customer, organization_id));
        }
    }

    debug!(
        customers = customers.len(),
        in_window = contacts.len(),
        %window,
        "Filtered customers by join date"
    );

    Ok(contacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn customer(since: &str, first: &str) -> Customer {
        Customer {
            customer_since: since.to_string(),
            first_name: first.to_string(),
            last_name: "Doe".to_string(),
            phone: "555-0100".to_string(),
            email: format!("{}@example.com", first.to_lowercase()),
        }
    }

    fn march() -> DateWindow {
        DateWindow::new(date(2024, 3, 1), date(2024, 3, 10))
    }

    #[rstest]
    #[case("05-Mar-2024 02:15 PM EST", Some(date(2024, 3, 5)))]
    #[case("03/05/2024", Some(date(2024, 3, 5)))]
    #[case("2024-03-05", Some(date(2024, 3, 5)))]
    #[case("03-05-2024", Some(date(2024, 3, 5)))]
    #[case("05-Mar-2024", Some(date(2024, 3, 5)))]
    #[case("sometime", None)]
    fn test_parse_join_date(#[case] value: &str, #[case] expected: Option<NaiveDate>) {
        assert_eq!(parse_join_date(value), expected);
    }

    #[rstest]
    #[case::before_start("29-Feb-2024 11:59 PM EST", false)]
    #[case::on_start("01-Mar-2024 12:00 AM EST", true)]
    #[case::inside("05-Mar-2024 02:15 PM EST", true)]
    #[case::on_end("10-Mar-2024 11:59 PM EST", true)]
    #[case::after_end("11-Mar-2024 12:00 AM EST", false)]
    fn test_window_is_inclusive(#[case] since: &str, #[case] included: bool) {
        let contacts = stage_customers(&[customer(since, "Ada")], &march(), "001ORG").unwrap();
        assert_eq!(contacts.len(), usize::from(included));
    }

    #[test]
    fn test_stage_customers_maps_fields_and_org() {
        let contacts =
            stage_customers(&[customer("03/05/2024", "Ada")], &march(), "001ORG").unwrap();

        assert_eq!(
            contacts,
            vec![Contact {
                first_name: "Ada".to_string(),
                account_id: "001ORG".to_string(),
                last_name: "Doe".to_string(),
                phone: "555-0100".to_string(),
                email: "ada@example.com".to_string(),
            }]
        );
    }

    #[test]
    fn test_blank_join_date_is_excluded() {
        let contacts = stage_customers(&[customer("", "Ada")], &march(), "001ORG").unwrap();
        assert!(contacts.is_empty());
    }

    #[test]
    fn test_unreadable_join_date_is_fatal() {
        let result = stage_customers(&[customer("soon", "Ada")], &march(), "001ORG");
        assert_eq!(
            result,
            Err(SyncError::InvalidJoinDate {
                value: "soon".to_string(),
                name: "Ada Doe".to_string(),
            })
        );
    }

    #[test]
    fn test_inverted_window_selects_nothing() {
        let window = DateWindow::new(date(2024, 3, 11), date(2024, 3, 10));
        let contacts = stage_customers(
            &[customer("10-Mar-2024 09:00 AM EST", "Ada"), customer("03/11/2024", "Bob")],
            &window,
            "001ORG",
        )
        .unwrap();
        assert!(contacts.is_empty());
    }
}
