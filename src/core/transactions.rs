//! Transaction pipeline
//!
//! Turns payments into staged opportunities:
//! 1. Inner-join payments with orders on `Order ID`
//! 2. Attach the record type and organization resolved from the CRM
//! 3. Derive the display name
//! 4. Map payment state and date onto `StageName` / `CloseDate`
//!
//! Payments whose order is absent from the orders export are dropped without
//! an error, as are orders nobody paid for.

use crate::core::naming::display_name;
use crate::types::{Opportunity, Order, Payment, SyncError};
use std::collections::HashMap;
use tracing::debug;

/// CRM identifiers attached to every staged record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrmIds {
    /// Id of the opportunity record type
    pub record_type_id: String,
    /// Id of the organization account the records belong to
    pub organization_id: String,
}

/// Inner join of payments with orders on order id
///
/// Output follows payment order. An order id repeated in the orders export
/// yields one pair per matching order.
pub fn join_payments<'a>(
    payments: &'a [Payment],
    orders: &'a [Order],
) -> Vec<(&'a Payment, &'a Order)> {
    let mut by_id: HashMap<&str, Vec<&Order>> = HashMap::new();
    for order in orders {
        by_id.entry(order.order_id.as_str()).or_default().push(order);
    }

    payments
        .iter()
        .flat_map(|payment| {
            by_id
                .get(payment.order_id.as_str())
                .into_iter()
                .flatten()
                .map(move |order| (payment, *order))
        })
        .collect()
}

/// Build one staged opportunity from a joined pair
///
/// # Errors
///
/// `SyncError::InvalidPaymentDate` if the payment date does not follow the
/// fixed-width POS layout the display name is sliced from.
pub fn stage_transaction(
    payment: &Payment,
    order: &Order,
    ids: &CrmIds,
) -> Result<Opportunity, SyncError> {
    let name = display_name(
        &order.customer_name,
        &payment.note,
        &payment.payment_date,
        &payment.amount,
    )
    .ok_or_else(|| SyncError::InvalidPaymentDate {
        value: payment.payment_date.clone(),
        order_id: payment.order_id.clone(),
    })?;

    Ok(Opportunity {
        record_type_id: ids.record_type_id.clone(),
        account_id: ids.organization_id.clone(),
        site_served: ids.organization_id.clone(),
        name,
        stage_name: payment.payment_state.clone(),
        close_date: payment.payment_date.clone(),
        amount: payment.amount.clone(),
    })
}

/// Run the transaction pipeline over a whole export
pub fn stage_transactions(
    payments: &[Payment],
    orders: &[Order],
    ids: &CrmIds,
) -> Result<Vec<Opportunity>, SyncError> {
    let joined = join_payments(payments, orders);
    debug!(
        payments = payments.len(),
        matched = joined.len(),
        "Joined payments with orders"
    );

    joined
        .into_iter()
        .map(|(payment, order)| stage_transaction(payment, order, ids))
        .collect()
}
