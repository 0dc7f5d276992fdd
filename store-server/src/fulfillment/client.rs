//! Warehouse API client
//!
//! Talks to the third-party warehouse over REST with an API-key header and a
//! bounded timeout. A timed-out push surfaces an error for the caller to
//! retry; it never affects order validity.

use std::time::Duration;

use thiserror::Error;

use super::payload::{WarehouseOrder, WarehouseProduct};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Bounded timeout for warehouse calls
const WAREHOUSE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("warehouse request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("warehouse response invalid: {0}")]
    Api(String),
}

/// Warehouse/fulfillment API client
#[derive(Clone)]
pub struct WarehouseClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WarehouseClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, BoxError> {
        let http = reqwest::Client::builder()
            .timeout(WAREHOUSE_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Create a product definition; returns the warehouse's reference id
    pub async fn create_product(
        &self,
        payload: &WarehouseProduct,
    ) -> Result<String, WarehouseError> {
        let resp: serde_json::Value = self
            .http
            .post(format!("{}/api/v1/products", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .json(payload)
            .send()
            .await?
            .json()
            .await?;

        extract_ref(&resp)
    }

    /// Update a previously pushed product in place.
    ///
    /// Targets the stored external reference so a re-push updates instead of
    /// creating a duplicate.
    pub async fn update_product(
        &self,
        external_ref: &str,
        payload: &WarehouseProduct,
    ) -> Result<String, WarehouseError> {
        self.http
            .put(format!(
                "{}/api/v1/products/{external_ref}",
                self.base_url
            ))
            .header("X-Api-Key", &self.api_key)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;

        Ok(external_ref.to_string())
    }

    /// Create a retail order; returns the warehouse's reference id
    pub async fn create_order(&self, payload: &WarehouseOrder) -> Result<String, WarehouseError> {
        let resp: serde_json::Value = self
            .http
            .post(format!("{}/api/v1/orders", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .json(payload)
            .send()
            .await?
            .json()
            .await?;

        extract_ref(&resp)
    }
}

fn extract_ref(resp: &serde_json::Value) -> Result<String, WarehouseError> {
    resp["id"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| WarehouseError::Api(format!("missing id in response: {resp}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_ref() {
        let resp = serde_json::json!({"id": "wh_12345", "status": "created"});
        assert_eq!(extract_ref(&resp).unwrap(), "wh_12345");
    }

    #[test]
    fn test_extract_ref_missing() {
        let resp = serde_json::json!({"error": "invalid sku"});
        assert!(matches!(
            extract_ref(&resp),
            Err(WarehouseError::Api(_))
        ));
    }
}
