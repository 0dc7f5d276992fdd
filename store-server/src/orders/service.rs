//! Order lifecycle orchestration
//!
//! Wires the pricing snapshot, the order store, the payment gateway, and the
//! notification dispatcher together. Notifications are spawned after the
//! durable write and never awaited by the request path.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    NoteAppend, OrderCreate, OrderNote, PaymentMethod, PaymentStatus, PaymentStatusUpdate,
    PaymentVerification, StatusUpdate,
};

use super::{money, snapshot, state_machine};
use crate::db::orders::{NewOrder, Order, OrderItem};
use crate::db::{catalog, orders as order_store};
use crate::error::ServiceResult;
use crate::notify;
use crate::orders::state_machine::OrderEvent;
use crate::state::AppState;

/// Response for order creation
#[derive(Debug, Serialize)]
pub struct OrderCreated {
    pub id: Uuid,
    pub order_number: String,
    pub total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_order_ref: Option<String>,
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderItem>,
}

/// Order detail: the aggregate row plus its items
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Create an order from the submitted cart.
///
/// Snapshot -> persist (with order-number retry) -> gateway intent ->
/// spawn OrderCreated notification.
pub async fn create_order(state: &AppState, req: OrderCreate) -> ServiceResult<OrderCreated> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    // Owner is the registered user when user_id is present, the guest
    // identity otherwise. A blank user_id is neither.
    if req.user_id.as_deref().is_some_and(|uid| uid.trim().is_empty()) {
        return Err(AppError::new(ErrorCode::GuestOrUserRequired).into());
    }

    let ids: Vec<Uuid> = req.items.iter().map(|i| i.product_id).collect();
    let products = catalog::find_by_ids(&state.pool, &ids).await?;
    let by_id: HashMap<Uuid, catalog::Product> =
        products.into_iter().map(|p| (p.id, p)).collect();

    let snap = snapshot::snapshot_items(&by_id, &req.items)?;

    // Tax and shipping are managed post-order; no discount at creation.
    let tax = Decimal::ZERO;
    let shipping = Decimal::ZERO;
    let discount = Decimal::ZERO;
    let total = money::compute_total(snap.subtotal, tax, shipping, discount);

    let (user_id, user_email, guest_name, guest_email) = match req.user_id {
        Some(uid) => (Some(uid), Some(req.customer_info.email.clone()), None, None),
        None => (
            None,
            None,
            Some(req.customer_info.name.clone()),
            Some(req.customer_info.email.clone()),
        ),
    };

    let new = NewOrder {
        user_id,
        user_email,
        guest_name,
        guest_email,
        subtotal: snap.subtotal,
        tax,
        shipping,
        discount,
        total,
        payment_method: req.payment_method,
        shipping_address: req.shipping_address,
        billing_address: req.billing_address,
        initial_note: req.order_notes,
    };

    let order = order_store::create_order(&state.pool, &new, &snap.items).await?;

    // One gateway intent per order; the stored ref guards against re-calls.
    let mut gateway_order_ref = None;
    if order.payment_method == PaymentMethod::Gateway {
        let Some(amount_minor) = money::to_minor_units(order.total) else {
            return Err(
                AppError::internal("order total not representable in minor units").into(),
            );
        };

        match state
            .gateway
            .create_order_intent(amount_minor, &state.currency, &order.order_number)
            .await
        {
            Ok(gateway_ref) => {
                order_store::set_gateway_order_ref(&state.pool, order.id, &gateway_ref).await?;
                gateway_order_ref = Some(gateway_ref);
            }
            Err(e) => {
                tracing::error!(
                    order_number = %order.order_number,
                    error = %e,
                    "Gateway intent creation failed"
                );
                if let Err(db_err) = order_store::mark_payment_failed(&state.pool, order.id).await
                {
                    tracing::error!(error = %db_err, "Failed to record gateway failure");
                }
                return Err(AppError::with_message(
                    ErrorCode::PaymentFailed,
                    "Payment gateway is unavailable, please retry",
                )
                .into());
            }
        }
    }

    let items = order_store::items_for_order(&state.pool, order.id).await?;

    spawn_notification(state, order.clone(), OrderEvent::Created);

    Ok(OrderCreated {
        id: order.id,
        order_number: order.order_number.clone(),
        total: order.total,
        gateway_order_ref,
        payment_method: order.payment_method,
        items,
    })
}

/// Verify an asynchronous payment confirmation.
///
/// Fail closed: any signature problem leaves the order untouched. On success
/// the payment completes and the order confirms in one atomic update.
pub async fn verify_payment(state: &AppState, req: PaymentVerification) -> ServiceResult<Order> {
    let order = order_store::find_by_id(&state.pool, req.order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    if order.payment_method != PaymentMethod::Gateway {
        return Err(AppError::new(ErrorCode::PaymentInvalidMethod).into());
    }

    // The callback must reference the intent opened for this order
    if order.gateway_order_ref.as_deref() != Some(req.gateway_order_ref.as_str()) {
        tracing::warn!(
            order_number = %order.order_number,
            "Payment verification for unknown gateway order ref"
        );
        return Err(AppError::new(ErrorCode::PaymentVerificationFailed).into());
    }

    if let Err(reason) = state.gateway.verify_payment_signature(
        &req.gateway_order_ref,
        &req.gateway_payment_ref,
        &req.signature,
    ) {
        tracing::warn!(
            order_number = %order.order_number,
            reason,
            "Payment verification rejected"
        );
        return Err(AppError::new(ErrorCode::PaymentVerificationFailed).into());
    }

    match order_store::complete_gateway_payment(&state.pool, order.id, &req.gateway_payment_ref)
        .await?
    {
        Some(updated) => {
            spawn_notification(state, updated.clone(), OrderEvent::Confirmed);
            Ok(updated)
        }
        None => {
            // Distinguish a duplicate callback from a genuine conflict
            let current = order_store::find_by_id(&state.pool, order.id)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

            if current.payment_status == PaymentStatus::Completed
                && current.gateway_payment_ref.as_deref()
                    == Some(req.gateway_payment_ref.as_str())
            {
                tracing::info!(
                    order_number = %current.order_number,
                    "Duplicate payment verification, already completed"
                );
                Ok(current)
            } else {
                Err(AppError::concurrent_modification(format!("Order {}", order.id)).into())
            }
        }
    }
}

/// Operator-invoked order status transition
pub async fn update_status(state: &AppState, id: Uuid, req: StatusUpdate) -> ServiceResult<Order> {
    let order = order_store::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    state_machine::check_status_update(&order, req.status, req.tracking_number.as_deref())?;

    let updated = order_store::transition_status(
        &state.pool,
        id,
        order.status,
        req.status,
        req.tracking_number.as_deref(),
    )
    .await?;

    if let Some(event) = state_machine::event_for_status(updated.status) {
        spawn_notification(state, updated.clone(), event);
    }

    Ok(updated)
}

/// Operator-invoked payment status transition
pub async fn update_payment_status(
    state: &AppState,
    id: Uuid,
    req: PaymentStatusUpdate,
) -> ServiceResult<Order> {
    let order = order_store::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    state_machine::check_payment_update(order.payment_status, req.payment_status)?;

    order_store::transition_payment_status(
        &state.pool,
        id,
        order.payment_status,
        req.payment_status,
    )
    .await
}

/// Append a timestamped note to the order log
pub async fn add_note(state: &AppState, id: Uuid, req: NoteAppend) -> ServiceResult<Order> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let note = OrderNote {
        body: req.body,
        created_at: Utc::now(),
    };
    order_store::append_note(&state.pool, id, &note).await
}

/// Fetch one order with its items
pub async fn get_order(state: &AppState, id: Uuid) -> ServiceResult<OrderDetail> {
    let order = order_store::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let items = order_store::items_for_order(&state.pool, order.id).await?;
    Ok(OrderDetail { order, items })
}

/// Fetch one order by its order number
pub async fn get_order_by_number(
    state: &AppState,
    order_number: &str,
) -> ServiceResult<OrderDetail> {
    let order = order_store::find_by_number(&state.pool, order_number)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let items = order_store::items_for_order(&state.pool, order.id).await?;
    Ok(OrderDetail { order, items })
}

/// List orders, newest first (operator view)
pub async fn list_orders(state: &AppState, limit: i64, offset: i64) -> ServiceResult<Vec<Order>> {
    Ok(order_store::list(&state.pool, limit, offset).await?)
}

/// Notification is downstream of the durable transition: spawned, never
/// awaited, failures logged inside the dispatcher.
fn spawn_notification(state: &AppState, order: Order, event: OrderEvent) {
    let mailer = state.mailer.clone();
    tokio::spawn(async move {
        notify::dispatch(mailer.as_ref(), &order, event).await;
    });
}
