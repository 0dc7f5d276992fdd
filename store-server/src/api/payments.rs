//! Payment verification endpoint
//!
//! On success the client redirects to the order-confirmation view; on
//! failure to a failure view carrying the order id for retry.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use uuid::Uuid;

use shared::error::{ApiResponse, AppError};
use shared::models::{OrderStatus, PaymentStatus, PaymentVerification};

use crate::orders::service;
use crate::state::AppState;

/// Verified payment outcome returned to the client
#[derive(Debug, Serialize)]
pub struct PaymentOutcome {
    pub order_id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
}

/// POST /api/payments/verify
pub async fn verify(
    State(state): State<AppState>,
    Json(payload): Json<PaymentVerification>,
) -> Result<Json<ApiResponse<PaymentOutcome>>, AppError> {
    let order = service::verify_payment(&state, payload).await?;

    Ok(Json(ApiResponse::success_with_message(
        "Payment verified",
        PaymentOutcome {
            order_id: order.id,
            order_number: order.order_number.clone(),
            status: order.status,
            payment_status: order.payment_status,
        },
    )))
}
