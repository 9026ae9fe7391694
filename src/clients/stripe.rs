//! Stripe integration via REST API (no SDK dependency)

use anyhow::{Context, Result, bail};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct StripeConfig {
    pub secret_key: String,

    pub publishable_key: String,

    pub webhook_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,

    pub client_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeRefund {
    pub id: String,

    pub status: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    config: StripeConfig,
}

impl StripeClient {
    const BASE_URL: &'static str = "https://api.stripe.com/v1";

    #[must_use]
    pub fn new(config: StripeConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub const fn with_shared_client(client: Client, config: StripeConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub fn publishable_key(&self) -> &str {
        &self.config.publishable_key
    }

    #[must_use]
    pub fn webhook_secret(&self) -> &str {
        &self.config.webhook_secret
    }

    /// Create a PaymentIntent for `amount_minor` (smallest currency unit).
    pub async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        order_id: i32,
    ) -> Result<PaymentIntent> {
        let amount = amount_minor.to_string();
        let order_ref = order_id.to_string();

        let response = self
            .client
            .post(format!("{}/payment_intents", Self::BASE_URL))
            .basic_auth(&self.config.secret_key, None::<&str>)
            .form(&[
                ("amount", amount.as_str()),
                ("currency", currency),
                ("metadata[order_id]", order_ref.as_str()),
            ])
            .send()
            .await
            .context("Stripe payment_intents request failed")?;

        if !response.status().is_success() {
            let message = extract_error(response).await;
            bail!("Stripe create intent failed: {message}");
        }

        let intent: PaymentIntent = response
            .json()
            .await
            .context("Failed to parse PaymentIntent response")?;

        debug!(intent_id = %intent.id, order_id, "Created payment intent");
        Ok(intent)
    }

    /// Refund (part of) a succeeded PaymentIntent.
    pub async fn create_refund(
        &self,
        payment_intent_id: &str,
        amount_minor: i64,
        reason: Option<&str>,
    ) -> Result<StripeRefund> {
        let amount = amount_minor.to_string();
        let mut form: Vec<(&str, &str)> = vec![
            ("payment_intent", payment_intent_id),
            ("amount", amount.as_str()),
        ];
        if reason.is_some() {
            form.push(("reason", "requested_by_customer"));
        }

        let response = self
            .client
            .post(format!("{}/refunds", Self::BASE_URL))
            .basic_auth(&self.config.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await
            .context("Stripe refunds request failed")?;

        if !response.status().is_success() {
            let message = extract_error(response).await;
            bail!("Stripe refund failed: {message}");
        }

        let refund: StripeRefund = response
            .json()
            .await
            .context("Failed to parse Refund response")?;

        debug!(refund_id = %refund.id, "Created refund");
        Ok(refund)
    }
}

async fn extract_error(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<StripeErrorBody>().await {
        Ok(body) => body
            .error
            .message
            .unwrap_or_else(|| format!("HTTP {status}")),
        Err(_) => format!("HTTP {status}"),
    }
}

/// Verify a `Stripe-Signature` header (HMAC-SHA256 over `t=<ts>.<payload>`)
/// and reject events outside the replay window.
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signature = "";
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }

    if timestamp.is_empty() || signature.is_empty() {
        return Err("Invalid Stripe-Signature header");
    }

    let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap_or(""));
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(signed_payload.as_bytes());

    // Constant-time comparison via verify_slice
    let sig_bytes = hex::decode(signature).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "Webhook signature mismatch")?;

    // Reject events older than 5 minutes
    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > 300 {
        return Err("Webhook timestamp too old");
    }

    Ok(())
}

/// Build a `Stripe-Signature` header value for `payload`. Mirrors
/// `verify_webhook_signature`; used by integration tests.
#[must_use]
pub fn sign_webhook_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap_or(""));
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(signed_payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    format!("t={timestamp},v1={signature}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_round_trip() {
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let secret = "whsec_test";
        let header = sign_webhook_payload(payload, secret, chrono::Utc::now().timestamp());

        assert!(verify_webhook_signature(payload, &header, secret).is_ok());
    }

    #[test]
    fn test_signature_rejects_tampered_payload() {
        let secret = "whsec_test";
        let header = sign_webhook_payload(b"original", secret, chrono::Utc::now().timestamp());

        assert!(verify_webhook_signature(b"tampered", &header, secret).is_err());
    }

    #[test]
    fn test_signature_rejects_stale_timestamp() {
        let payload = b"payload";
        let secret = "whsec_test";
        let stale = chrono::Utc::now().timestamp() - 600;
        let header = sign_webhook_payload(payload, secret, stale);

        assert_eq!(
            verify_webhook_signature(payload, &header, secret),
            Err("Webhook timestamp too old")
        );
    }

    #[test]
    fn test_malformed_header() {
        assert!(verify_webhook_signature(b"x", "v1=abc", "s").is_err());
        assert!(verify_webhook_signature(b"x", "t=123", "s").is_err());
        assert!(verify_webhook_signature(b"x", "", "s").is_err());
    }
}
