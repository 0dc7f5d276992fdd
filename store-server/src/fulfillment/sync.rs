//! Fulfillment sync operations
//!
//! Pushes product definitions and retail orders to the warehouse, keyed by
//! SKU / order number for idempotent re-push. Failures surface as
//! `ExternalServiceError` so the operator retries; the bulk sync reports
//! per-item outcomes rather than failing atomically.

use serde::Serialize;
use uuid::Uuid;

use shared::error::{AppError, ErrorCode};

use super::payload;
use crate::db::{catalog, fulfillment_refs, orders};
use crate::error::{ServiceError, ServiceResult};
use crate::state::AppState;

/// Push (or idempotently re-push) one product definition
pub async fn push_product(state: &AppState, product_id: Uuid) -> ServiceResult<String> {
    let product = catalog::find_by_id(&state.pool, product_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::ProductNotFound,
                format!("Product {product_id} not found"),
            )
        })?;

    push_product_inner(state, &product).await
}

async fn push_product_inner(
    state: &AppState,
    product: &catalog::Product,
) -> ServiceResult<String> {
    let body = payload::product_payload(product);
    let existing =
        fulfillment_refs::find(&state.pool, fulfillment_refs::KIND_PRODUCT, &body.sku).await?;

    let result = match &existing {
        Some(external_ref) => state.warehouse.update_product(external_ref, &body).await,
        None => state.warehouse.create_product(&body).await,
    };

    let external_ref = result.map_err(|e| {
        tracing::warn!(sku = %body.sku, error = %e, "Warehouse product push failed");
        AppError::external_service(format!("warehouse push failed for {}: {e}", body.sku))
    })?;

    fulfillment_refs::upsert(
        &state.pool,
        fulfillment_refs::KIND_PRODUCT,
        &body.sku,
        &external_ref,
    )
    .await?;

    tracing::info!(sku = %body.sku, external_ref = %external_ref, "Product pushed to warehouse");
    Ok(external_ref)
}

/// Push a retail order to the warehouse
pub async fn push_order(state: &AppState, order_id: Uuid) -> ServiceResult<String> {
    let order = orders::find_by_id(&state.pool, order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let items = orders::items_for_order(&state.pool, order.id).await?;

    // Retail orders are immutable downstream; a second push returns the
    // existing reference instead of creating a duplicate.
    if let Some(external_ref) =
        fulfillment_refs::find(&state.pool, fulfillment_refs::KIND_ORDER, &order.order_number)
            .await?
    {
        tracing::info!(
            order_number = %order.order_number,
            external_ref = %external_ref,
            "Order already pushed to warehouse"
        );
        return Ok(external_ref);
    }

    let body = payload::order_payload(&order, &items);
    let external_ref = state.warehouse.create_order(&body).await.map_err(|e| {
        tracing::warn!(order_number = %order.order_number, error = %e, "Warehouse order push failed");
        AppError::external_service(format!(
            "warehouse push failed for order {}: {e}",
            order.order_number
        ))
    })?;

    fulfillment_refs::upsert(
        &state.pool,
        fulfillment_refs::KIND_ORDER,
        &order.order_number,
        &external_ref,
    )
    .await?;

    tracing::info!(
        order_number = %order.order_number,
        external_ref = %external_ref,
        "Order pushed to warehouse"
    );
    Ok(external_ref)
}

/// Per-item outcome report for the bulk product sync
#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    pub pushed: u32,
    pub failed: u32,
    pub failures: Vec<SyncFailure>,
}

#[derive(Debug, Serialize)]
pub struct SyncFailure {
    pub sku: String,
    pub error: String,
}

/// Push every active product, reporting per-item success/failure counts
pub async fn sync_all_products(state: &AppState) -> ServiceResult<SyncReport> {
    let products = catalog::list_active(&state.pool).await?;
    let mut report = SyncReport::default();

    for product in &products {
        match push_product_inner(state, product).await {
            Ok(_) => report.pushed += 1,
            Err(e) => {
                report.failed += 1;
                let error = match e {
                    ServiceError::App(app) => app.message,
                    ServiceError::Db(db) => db.to_string(),
                };
                report.failures.push(SyncFailure {
                    sku: payload::sku_for(product),
                    error,
                });
            }
        }
    }

    tracing::info!(
        pushed = report.pushed,
        failed = report.failed,
        "Bulk product sync finished"
    );
    Ok(report)
}
