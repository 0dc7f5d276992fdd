//! Application state for store-server

use std::sync::Arc;

use aws_sdk_sesv2::Client as SesClient;
use sqlx::PgPool;

use crate::config::Config;
use crate::fulfillment::WarehouseClient;
use crate::notify::{EmailTransport, SesTransport};
use crate::razorpay::RazorpayClient;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
///
/// External clients are constructed once here and injected everywhere else,
/// so tests can substitute doubles at the trait/struct seam.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Payment gateway client (intent creation + callback verification)
    pub gateway: RazorpayClient,
    /// Warehouse/fulfillment API client
    pub warehouse: WarehouseClient,
    /// Email transport for order notifications
    pub mailer: Arc<dyn EmailTransport>,
    /// ISO currency code for gateway intents
    pub currency: String,
}

impl AppState {
    /// Create a new AppState
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let ses = SesClient::new(&aws_config);

        let gateway = RazorpayClient::new(
            &config.gateway_api_url,
            &config.gateway_key_id,
            &config.gateway_key_secret,
        )?;
        let warehouse = WarehouseClient::new(&config.warehouse_api_url, &config.warehouse_api_key)?;

        Ok(Self {
            pool,
            gateway,
            warehouse,
            mailer: Arc::new(SesTransport::new(ses, config.ses_from_email.clone())),
            currency: config.currency.clone(),
        })
    }
}
