//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Payment gateway API base URL
    pub gateway_api_url: String,
    /// Payment gateway key id (basic auth user)
    pub gateway_key_id: String,
    /// Payment gateway key secret (basic auth password + callback HMAC key)
    pub gateway_key_secret: String,
    /// ISO currency code for gateway intents
    pub currency: String,
    /// Warehouse/fulfillment API base URL
    pub warehouse_api_url: String,
    /// Warehouse API key
    pub warehouse_api_key: String,
    /// SES sender email address
    pub ses_from_email: String,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: environment.clone(),
            gateway_api_url: std::env::var("GATEWAY_API_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com".into()),
            gateway_key_id: Self::require_secret("GATEWAY_KEY_ID", &environment)?,
            gateway_key_secret: Self::require_secret("GATEWAY_KEY_SECRET", &environment)?,
            currency: std::env::var("ORDER_CURRENCY").unwrap_or_else(|_| "INR".into()),
            warehouse_api_url: std::env::var("WAREHOUSE_API_URL")
                .unwrap_or_else(|_| "https://api.warehouse.example.com".into()),
            warehouse_api_key: Self::require_secret("WAREHOUSE_API_KEY", &environment)?,
            ses_from_email: std::env::var("SES_FROM_EMAIL")
                .unwrap_or_else(|_| "orders@storefront.example.com".into()),
        })
    }
}
