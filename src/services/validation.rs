use garde::Validate;
use tracing::warn;

use crate::models::order::Order;

/// Every problem found in an order, in discovery order.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid order: {}", .problems.join("; "))]
pub struct OrderValidationError {
    pub problems: Vec<String>,
}

/// Validate an order before it is persisted.
///
/// Field-level rules come from the `garde` attributes on the model; on top of
/// those the order must be internally consistent:
/// - `payment.transaction` equals `order_uid`
/// - every item carries the order's `track_number`
///
/// All problems are collected, so a rejected message reports everything that
/// is wrong with it at once.
pub fn validate_order(order: &Order) -> Result<(), OrderValidationError> {
    let mut problems = Vec::new();

    if let Err(report) = order.validate() {
        for (path, error) in report.iter() {
            problems.push(format!("{}: {}", path, error));
        }
    }

    if order.payment.transaction != order.order_uid {
        problems.push("payment.transaction: must equal order_uid".to_string());
    }

    for (i, item) in order.items.iter().enumerate() {
        if item.track_number != order.track_number {
            problems.push(format!(
                "items[{}].track_number: must equal order.track_number",
                i
            ));
        }
    }

    if problems.is_empty() {
        return Ok(());
    }

    warn!(
        order_uid = %order.order_uid,
        problems = ?problems,
        "Order validation failed"
    );
    Err(OrderValidationError { problems })
}
