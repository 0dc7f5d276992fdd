//! Notification dispatcher
//!
//! Best-effort, at-most-once email dispatch keyed off order state
//! transitions. The transition is the durable fact; a failed or skipped
//! email is logged and never rolls anything back. There is no retry policy.

use async_trait::async_trait;
use aws_sdk_sesv2::Client as SesClient;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};

use crate::db::orders::Order;
use crate::orders::state_machine::OrderEvent;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Email transport seam: production uses SES, tests substitute a double
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), BoxError>;
}

/// AWS SES transport
pub struct SesTransport {
    ses: SesClient,
    from: String,
}

impl SesTransport {
    pub fn new(ses: SesClient, from: String) -> Self {
        Self { ses, from }
    }
}

#[async_trait]
impl EmailTransport for SesTransport {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), BoxError> {
        let subject = Content::builder().data(subject).build()?;
        let body = Body::builder()
            .text(Content::builder().data(body).build()?)
            .build();
        let message = Message::builder().subject(subject).body(body).build();

        self.ses
            .send_email()
            .from_email_address(&self.from)
            .destination(Destination::builder().to_addresses(to).build())
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await?;

        Ok(())
    }
}

/// Render subject and body for an event; None for events without a template
pub fn template(order: &Order, event: OrderEvent) -> Option<(String, String)> {
    let n = &order.order_number;
    let name = order.customer_name();

    match event {
        OrderEvent::Created => Some((
            format!("Order {n} received"),
            format!(
                "Hi {name},\n\n\
                 We have received your order {n} for a total of {}.\n\
                 We will email you again once it is confirmed.\n\n\
                 Thank you for shopping with us.",
                order.total
            ),
        )),
        OrderEvent::Confirmed => Some((
            format!("Order {n} confirmed"),
            format!(
                "Hi {name},\n\n\
                 Your payment was received and order {n} is confirmed.\n\
                 We will let you know when it ships.",
            ),
        )),
        OrderEvent::Processing => Some((
            format!("Order {n} is being prepared"),
            format!(
                "Hi {name},\n\n\
                 Order {n} is being picked and packed.",
            ),
        )),
        OrderEvent::Shipped => {
            let tracking = order.tracking_number.as_deref().unwrap_or("-");
            Some((
                format!("Order {n} shipped"),
                format!(
                    "Hi {name},\n\n\
                     Order {n} is on its way.\n\
                     Tracking number: {tracking}",
                ),
            ))
        }
        OrderEvent::Delivered => Some((
            format!("Order {n} delivered"),
            format!(
                "Hi {name},\n\n\
                 Order {n} has been delivered. We hope you enjoy it!",
            ),
        )),
        OrderEvent::Cancelled => Some((
            format!("Order {n} cancelled"),
            format!(
                "Hi {name},\n\n\
                 Order {n} has been cancelled.\n\
                 If this was a mistake, please place a new order or contact support.",
            ),
        )),
        // No customer-facing template yet; refunds are communicated manually
        OrderEvent::Refunded => None,
    }
}

/// Dispatch a notification for a state transition.
///
/// Never fails: a missing recipient, a missing template, and a transport
/// error are all logged only.
pub async fn dispatch(transport: &dyn EmailTransport, order: &Order, event: OrderEvent) {
    let Some(to) = order.recipient_email() else {
        tracing::warn!(
            order_number = %order.order_number,
            event = ?event,
            "No recipient email for order notification"
        );
        return;
    };

    let Some((subject, body)) = template(order, event) else {
        tracing::debug!(event = ?event, "No template for event, skipping notification");
        return;
    };

    match transport.send(to, &subject, &body).await {
        Ok(()) => tracing::info!(
            order_number = %order.order_number,
            to = to,
            event = ?event,
            "Order notification sent"
        ),
        Err(e) => tracing::warn!(
            order_number = %order.order_number,
            error = %e,
            event = ?event,
            "Order notification failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::orders::state_machine::test_support::sample_order;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl EmailTransport for RecordingTransport {
        async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), BoxError> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string(), body.to_string()));
            Ok(())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl EmailTransport for FailingTransport {
        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), BoxError> {
            Err("smtp connection refused".into())
        }
    }

    #[tokio::test]
    async fn test_dispatch_to_guest_email() {
        let transport = RecordingTransport::default();
        let order = sample_order();

        dispatch(&transport, &order, OrderEvent::Created).await;

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "asha@example.com");
        assert!(sent[0].1.contains(&order.order_number));
        assert!(sent[0].2.contains("250"));
    }

    #[tokio::test]
    async fn test_dispatch_to_user_email() {
        let transport = RecordingTransport::default();
        let mut order = sample_order();
        order.user_id = Some("user_42".to_string());
        order.user_email = Some("registered@example.com".to_string());
        order.guest_name = None;
        order.guest_email = None;

        dispatch(&transport, &order, OrderEvent::Confirmed).await;

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "registered@example.com");
    }

    #[tokio::test]
    async fn test_dispatch_without_recipient_is_noop() {
        let transport = RecordingTransport::default();
        let mut order = sample_order();
        order.guest_email = None;

        dispatch(&transport, &order, OrderEvent::Created).await;

        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_swallows_transport_failure() {
        // Must not panic or propagate; the transition already happened
        let order = sample_order();
        dispatch(&FailingTransport, &order, OrderEvent::Created).await;
    }

    #[tokio::test]
    async fn test_unimplemented_event_is_noop() {
        let transport = RecordingTransport::default();
        let order = sample_order();

        dispatch(&transport, &order, OrderEvent::Refunded).await;

        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_shipped_template_contains_tracking() {
        let mut order = sample_order();
        order.tracking_number = Some("AWB987654".to_string());

        let (subject, body) = template(&order, OrderEvent::Shipped).unwrap();
        assert!(subject.contains("shipped"));
        assert!(body.contains("AWB987654"));
    }
}
