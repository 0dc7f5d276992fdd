//! Payment gateway integration via REST API (no SDK dependency)
//!
//! One order intent is opened per order at checkout; the customer pays
//! out-of-band and the client relays a signed callback. Verification
//! recomputes the HMAC over `order_ref|payment_ref` with the shared secret
//! and compares in constant time; any mismatch is rejection.

use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Bounded timeout for gateway calls. A timed-out call on the verification
/// path is treated as rejection by the caller (fail closed).
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("gateway response invalid: {0}")]
    Api(String),
}

/// Payment gateway client
#[derive(Clone)]
pub struct RazorpayClient {
    http: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayClient {
    pub fn new(base_url: &str, key_id: &str, key_secret: &str) -> Result<Self, BoxError> {
        let http = reqwest::Client::builder().timeout(GATEWAY_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
        })
    }

    /// Create a payment order intent. Amount is in minor units (paise).
    ///
    /// Called once per gateway order at creation time; the caller stores the
    /// returned id and must not call again once an id is present.
    pub async fn create_order_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<String, GatewayError> {
        let resp: serde_json::Value = self
            .http
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&serde_json::json!({
                "amount": amount_minor,
                "currency": currency,
                "receipt": receipt,
                "payment_capture": 1,
            }))
            .send()
            .await?
            .json()
            .await?;

        resp["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| GatewayError::Api(format!("order intent creation failed: {resp}")))
    }

    /// Verify a payment callback signature against this client's secret
    pub fn verify_payment_signature(
        &self,
        order_ref: &str,
        payment_ref: &str,
        signature: &str,
    ) -> Result<(), &'static str> {
        verify_signature(order_ref, payment_ref, signature, &self.key_secret)
    }
}

/// Verify a payment callback signature (HMAC-SHA256)
///
/// Recomputes the MAC over `"{order_ref}|{payment_ref}"` and compares via
/// `Mac::verify_slice` (constant time). Malformed hex is rejection, never
/// partial trust.
pub fn verify_signature(
    order_ref: &str,
    payment_ref: &str,
    signature: &str,
    secret: &str,
) -> Result<(), &'static str> {
    let payload = format!("{order_ref}|{payment_ref}");
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(payload.as_bytes());

    let sig_bytes = hex::decode(signature).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "Payment signature mismatch")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(order_ref: &str, payment_ref: &str, secret: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{order_ref}|{payment_ref}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_verify_valid_signature() {
        let sig = sign("order_abc", "pay_xyz", "secret123");
        assert!(verify_signature("order_abc", "pay_xyz", &sig, "secret123").is_ok());
    }

    #[test]
    fn test_verify_tampered_signature() {
        let mut sig = sign("order_abc", "pay_xyz", "secret123");
        // Flip the last hex digit
        let last = sig.pop().unwrap();
        sig.push(if last == '0' { '1' } else { '0' });

        assert!(verify_signature("order_abc", "pay_xyz", &sig, "secret123").is_err());
    }

    #[test]
    fn test_verify_wrong_secret() {
        let sig = sign("order_abc", "pay_xyz", "secret123");
        assert!(verify_signature("order_abc", "pay_xyz", &sig, "other-secret").is_err());
    }

    #[test]
    fn test_verify_swapped_payment_ref() {
        let sig = sign("order_abc", "pay_xyz", "secret123");
        assert!(verify_signature("order_abc", "pay_other", &sig, "secret123").is_err());
    }

    #[test]
    fn test_verify_malformed_hex() {
        assert_eq!(
            verify_signature("order_abc", "pay_xyz", "not-hex!", "secret123"),
            Err("Invalid signature hex")
        );
        assert!(verify_signature("order_abc", "pay_xyz", "", "secret123").is_err());
    }
}
