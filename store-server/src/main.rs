//! store-server — Storefront order core
//!
//! Stateless HTTP service that owns the order & payment lifecycle:
//! - Creates orders from a cart (pricing snapshot + order number)
//! - Reserves payment-gateway intents and verifies signed callbacks
//! - Applies order/payment state transitions with optimistic concurrency
//! - Dispatches best-effort customer emails on transitions
//! - Pushes products and retail orders to the external warehouse system

mod api;
mod config;
mod db;
mod error;
mod fulfillment;
mod notify;
mod orders;
mod razorpay;
mod state;

use config::Config;
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "store_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting store-server (env: {})", config.environment);

    // Initialize application state
    let state = AppState::new(&config).await?;

    let app = api::create_router(state);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("store-server listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
