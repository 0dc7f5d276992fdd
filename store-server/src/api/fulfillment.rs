//! Fulfillment push endpoints (operator-invoked)

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use uuid::Uuid;

use shared::error::AppError;

use crate::fulfillment::sync::{self, SyncReport};
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, AppError>;

/// External reference returned by a push
#[derive(Debug, Serialize)]
pub struct PushResult {
    pub external_ref: String,
}

/// POST /api/fulfillment/products/{id} — push/update one product
pub async fn push_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<PushResult> {
    let external_ref = sync::push_product(&state, id).await?;
    Ok(Json(PushResult { external_ref }))
}

/// POST /api/fulfillment/orders/{id} — push a retail order
pub async fn push_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<PushResult> {
    let external_ref = sync::push_order(&state, id).await?;
    Ok(Json(PushResult { external_ref }))
}

/// POST /api/fulfillment/products/sync — bulk sync with per-item outcomes
pub async fn sync_all_products(State(state): State<AppState>) -> ApiResult<SyncReport> {
    let report = sync::sync_all_products(&state).await?;
    Ok(Json(report))
}
