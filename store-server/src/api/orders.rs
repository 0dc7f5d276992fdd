//! Order API handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use shared::error::AppError;
use shared::models::{NoteAppend, OrderCreate, PaymentStatusUpdate, StatusUpdate};

use crate::db::orders::Order;
use crate::orders::service::{self, OrderCreated, OrderDetail};
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, AppError>;

/// Query params for listing orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// POST /api/orders — create an order from the submitted cart
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<OrderCreate>,
) -> Result<(StatusCode, Json<OrderCreated>), AppError> {
    let created = service::create_order(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/orders — list orders, newest first (operator view)
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Order>> {
    let orders = service::list_orders(&state, query.limit.clamp(1, 200), query.offset.max(0))
        .await?;
    Ok(Json(orders))
}

/// GET /api/orders/{id} — order detail with items
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderDetail> {
    let detail = service::get_order(&state, id).await?;
    Ok(Json(detail))
}

/// GET /api/orders/by-number/{order_number}
pub async fn get_by_number(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> ApiResult<OrderDetail> {
    let detail = service::get_order_by_number(&state, &order_number).await?;
    Ok(Json(detail))
}

/// PUT /api/orders/{id}/status — operator status transition
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdate>,
) -> ApiResult<Order> {
    let order = service::update_status(&state, id, payload).await?;
    Ok(Json(order))
}

/// PUT /api/orders/{id}/payment-status — operator payment transition
pub async fn update_payment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PaymentStatusUpdate>,
) -> ApiResult<Order> {
    let order = service::update_payment_status(&state, id, payload).await?;
    Ok(Json(order))
}

/// POST /api/orders/{id}/notes — append to the order note log
pub async fn add_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NoteAppend>,
) -> ApiResult<Order> {
    let order = service::add_note(&state, id, payload).await?;
    Ok(Json(order))
}
