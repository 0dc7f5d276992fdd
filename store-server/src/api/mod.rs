//! API routes for store-server

pub mod fulfillment;
pub mod health;
pub mod orders;
pub mod payments;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    let orders = Router::new()
        .route("/api/orders", post(orders::create).get(orders::list))
        .route("/api/orders/{id}", get(orders::get_by_id))
        .route(
            "/api/orders/by-number/{order_number}",
            get(orders::get_by_number),
        )
        .route("/api/orders/{id}/status", put(orders::update_status))
        .route(
            "/api/orders/{id}/payment-status",
            put(orders::update_payment_status),
        )
        .route("/api/orders/{id}/notes", post(orders::add_note));

    let payments = Router::new().route("/api/payments/verify", post(payments::verify));

    let fulfillment = Router::new()
        .route(
            "/api/fulfillment/products/sync",
            post(fulfillment::sync_all_products),
        )
        .route(
            "/api/fulfillment/products/{id}",
            post(fulfillment::push_product),
        )
        .route("/api/fulfillment/orders/{id}", post(fulfillment::push_order));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(orders)
        .merge(payments)
        .merge(fulfillment)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
