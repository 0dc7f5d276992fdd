//! Order and payment state machines
//!
//! The two lifecycles are validated independently; cross-constraints gate
//! shipping on completed payment for gateway orders. Every successful
//! transition produces an [`OrderEvent`] consumed by the notification
//! dispatcher, decoupling transition durability from email delivery.

use shared::error::{AppError, ErrorCode};
use shared::models::{OrderStatus, PaymentMethod, PaymentStatus};

use crate::db::orders::Order;

/// Notification event produced by a successful transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    Created,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

/// Legal order status transitions: the linear fulfillment chain plus
/// CANCELLED/REFUNDED as alternate terminals from any non-terminal state.
pub fn order_transition_allowed(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    match (from, to) {
        (Pending, Confirmed)
        | (Confirmed, Processing)
        | (Processing, Shipped)
        | (Shipped, Delivered) => true,
        (from, Cancelled | Refunded) => !from.is_terminal(),
        _ => false,
    }
}

/// Legal payment status transitions. PENDING may complete directly since
/// callback verification captures without an intermediate PROCESSING step.
pub fn payment_transition_allowed(from: PaymentStatus, to: PaymentStatus) -> bool {
    use PaymentStatus::*;
    matches!(
        (from, to),
        (Pending, Processing)
            | (Pending, Completed)
            | (Processing, Completed)
            | (Pending, Failed)
            | (Processing, Failed)
            | (Pending, Cancelled)
            | (Processing, Cancelled)
            | (Completed, Refunded)
    )
}

/// Validate an operator-requested order status transition, including the
/// cross-machine constraints.
pub fn check_status_update(
    order: &Order,
    to: OrderStatus,
    tracking_number: Option<&str>,
) -> Result<(), AppError> {
    if !order_transition_allowed(order.status, to) {
        return Err(AppError::with_message(
            ErrorCode::InvalidStatusTransition,
            format!("Cannot transition order from {} to {}", order.status, to),
        ));
    }

    // Gateway orders ship only after the payment has completed
    if matches!(to, OrderStatus::Shipped | OrderStatus::Delivered)
        && order.payment_method == PaymentMethod::Gateway
        && order.payment_status != PaymentStatus::Completed
    {
        return Err(AppError::new(ErrorCode::PaymentNotCompleted));
    }

    // Tracking number must be supplied atomically with the SHIPPED update
    if to == OrderStatus::Shipped && tracking_number.is_none_or(|t| t.trim().is_empty()) {
        return Err(AppError::new(ErrorCode::TrackingNumberRequired));
    }

    Ok(())
}

/// Validate an operator-requested payment status transition
pub fn check_payment_update(from: PaymentStatus, to: PaymentStatus) -> Result<(), AppError> {
    if !payment_transition_allowed(from, to) {
        return Err(AppError::with_message(
            ErrorCode::InvalidPaymentTransition,
            format!("Cannot transition payment from {from} to {to}"),
        ));
    }
    Ok(())
}

/// Notification event for an order that just reached `status`
pub fn event_for_status(status: OrderStatus) -> Option<OrderEvent> {
    match status {
        OrderStatus::Confirmed => Some(OrderEvent::Confirmed),
        OrderStatus::Processing => Some(OrderEvent::Processing),
        OrderStatus::Shipped => Some(OrderEvent::Shipped),
        OrderStatus::Delivered => Some(OrderEvent::Delivered),
        OrderStatus::Cancelled => Some(OrderEvent::Cancelled),
        OrderStatus::Refunded => Some(OrderEvent::Refunded),
        OrderStatus::Pending => None,
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_order;
    use super::*;

    #[test]
    fn test_order_linear_chain() {
        use OrderStatus::*;
        assert!(order_transition_allowed(Pending, Confirmed));
        assert!(order_transition_allowed(Confirmed, Processing));
        assert!(order_transition_allowed(Processing, Shipped));
        assert!(order_transition_allowed(Shipped, Delivered));

        // No skipping steps
        assert!(!order_transition_allowed(Pending, Shipped));
        assert!(!order_transition_allowed(Confirmed, Delivered));
        // No going backwards
        assert!(!order_transition_allowed(Shipped, Processing));
    }

    #[test]
    fn test_cancel_reachable_from_non_terminal_only() {
        use OrderStatus::*;
        for from in [Pending, Confirmed, Processing, Shipped] {
            assert!(order_transition_allowed(from, Cancelled), "{from:?}");
            assert!(order_transition_allowed(from, Refunded), "{from:?}");
        }
        for from in [Delivered, Cancelled, Refunded] {
            assert!(!order_transition_allowed(from, Cancelled), "{from:?}");
            assert!(!order_transition_allowed(from, Refunded), "{from:?}");
        }
    }

    #[test]
    fn test_payment_transitions() {
        use PaymentStatus::*;
        assert!(payment_transition_allowed(Pending, Processing));
        assert!(payment_transition_allowed(Pending, Completed));
        assert!(payment_transition_allowed(Processing, Completed));
        assert!(payment_transition_allowed(Pending, Failed));
        assert!(payment_transition_allowed(Completed, Refunded));

        assert!(!payment_transition_allowed(Completed, Pending));
        assert!(!payment_transition_allowed(Failed, Completed));
        assert!(!payment_transition_allowed(Refunded, Completed));
        assert!(!payment_transition_allowed(Pending, Refunded));
    }

    #[test]
    fn test_shipped_requires_tracking_number() {
        let mut order = sample_order();
        order.status = OrderStatus::Processing;
        order.payment_status = PaymentStatus::Completed;

        let err = check_status_update(&order, OrderStatus::Shipped, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::TrackingNumberRequired);

        let err = check_status_update(&order, OrderStatus::Shipped, Some("  ")).unwrap_err();
        assert_eq!(err.code, ErrorCode::TrackingNumberRequired);

        assert!(check_status_update(&order, OrderStatus::Shipped, Some("AWB123456")).is_ok());
    }

    #[test]
    fn test_gateway_order_cannot_ship_unpaid() {
        let mut order = sample_order();
        order.status = OrderStatus::Processing;
        order.payment_status = PaymentStatus::Pending;

        let err =
            check_status_update(&order, OrderStatus::Shipped, Some("AWB123456")).unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentNotCompleted);
    }

    #[test]
    fn test_cash_order_ships_without_payment() {
        let mut order = sample_order();
        order.status = OrderStatus::Processing;
        order.payment_method = PaymentMethod::CashOnDelivery;
        order.payment_status = PaymentStatus::Pending;

        assert!(check_status_update(&order, OrderStatus::Shipped, Some("AWB123456")).is_ok());
    }

    #[test]
    fn test_cancel_delivered_is_conflict() {
        let mut order = sample_order();
        order.status = OrderStatus::Delivered;

        let err = check_status_update(&order, OrderStatus::Cancelled, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusTransition);
        assert_eq!(err.http_status(), http::StatusCode::CONFLICT);
    }

    #[test]
    fn test_check_payment_update() {
        assert!(check_payment_update(PaymentStatus::Pending, PaymentStatus::Processing).is_ok());
        let err = check_payment_update(PaymentStatus::Completed, PaymentStatus::Pending)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPaymentTransition);
    }

    #[test]
    fn test_event_for_status() {
        assert_eq!(
            event_for_status(OrderStatus::Shipped),
            Some(OrderEvent::Shipped)
        );
        assert_eq!(
            event_for_status(OrderStatus::Cancelled),
            Some(OrderEvent::Cancelled)
        );
        assert_eq!(event_for_status(OrderStatus::Pending), None);
    }
}
