//! Hosted checkout flow: the provider hosts the payment page; completion is
//! learned by polling the session and/or via a signed webhook.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::errors::ApiError;
use crate::models::payment::PaymentMethod;

use super::{IntentRequest, PaymentIntent, PaymentOutcome, PaymentProvider, VerifyRequest};

const API_BASE: &str = "https://api.stripe.com/v1";

/// Placeholder the provider substitutes with the real session id on redirect.
const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Accepted clock skew for webhook timestamps.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub struct StripeProvider {
    http: reqwest::Client,
    api_key: String,
    webhook_secret: String,
}

#[derive(Debug, Deserialize)]
struct CheckoutSession {
    id: String,
    url: Option<String>,
    payment_status: String,
    status: Option<String>,
    amount_total: Option<i64>,
    currency: Option<String>,
}

impl StripeProvider {
    pub fn new(api_key: String, webhook_secret: String) -> Self {
        StripeProvider {
            http: reqwest::Client::new(),
            api_key,
            webhook_secret,
        }
    }

    async fn fetch_session(&self, session_id: &str) -> Result<CheckoutSession, ApiError> {
        let resp = self
            .http
            .get(format!("{}/checkout/sessions/{}", API_BASE, session_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(ApiError::Provider(format!(
                "Status check failed: {}",
                detail
            )));
        }
        Ok(resp.json().await?)
    }
}

fn outcome_from_session(session: CheckoutSession) -> PaymentOutcome {
    PaymentOutcome {
        paid: session.payment_status == "paid",
        correlation_id: session.id,
        payment_id: None,
        signature: None,
        payment_status: Some(session.payment_status),
        session_status: session.status,
        amount_minor: session.amount_total,
        currency: session.currency,
    }
}

/// Splits a `t=<unix>,v1=<hex>` signature header.
fn parse_signature_header(header: &str) -> Result<(i64, String), ApiError> {
    let mut timestamp = None;
    let mut v1 = None;
    for part in header.split(',') {
        match part.split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => v1 = Some(value.to_string()),
            _ => {}
        }
    }
    match (timestamp, v1) {
        (Some(t), Some(sig)) => Ok((t, sig)),
        _ => Err(ApiError::Verification(
            "malformed signature header".to_string(),
        )),
    }
}

/// HMAC-SHA256 over "timestamp.body", constant-time compared against the
/// header's v1 value. Timestamps outside the tolerance window are rejected.
fn verify_webhook_signature(body: &[u8], header: &str, secret: &str) -> Result<(), ApiError> {
    let (timestamp, v1) = parse_signature_header(header)?;

    let now = chrono::Utc::now().timestamp();
    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(ApiError::Verification(
            "timestamp outside tolerance".to_string(),
        ));
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| ApiError::Verification("invalid signing key".to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    let expected = hex::encode(mac.finalize().into_bytes());

    if bool::from(expected.as_bytes().ct_eq(v1.as_bytes())) {
        Ok(())
    } else {
        Err(ApiError::Verification("signature mismatch".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: WebhookData,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    object: WebhookSession,
}

#[derive(Debug, Deserialize)]
struct WebhookSession {
    id: String,
    #[serde(default)]
    payment_status: Option<String>,
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Stripe
    }

    async fn create_intent(&self, req: &IntentRequest) -> Result<PaymentIntent, ApiError> {
        let origin = req.origin_url.as_deref().ok_or_else(|| {
            ApiError::InvalidRequest("origin_url is required for checkout".to_string())
        })?;
        let success_url = format!(
            "{}/booking-success?session_id={}",
            origin, SESSION_ID_PLACEHOLDER
        );
        let cancel_url = format!("{}/booking", origin);

        let amount_minor = (req.amount * 100.0).round() as i64;
        let amount_str = amount_minor.to_string();
        let product_name = format!("Hotel booking {}", req.booking_id);

        let form: Vec<(&str, &str)> = vec![
            ("mode", "payment"),
            ("success_url", &success_url),
            ("cancel_url", &cancel_url),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", &req.currency),
            ("line_items[0][price_data][unit_amount]", &amount_str),
            ("line_items[0][price_data][product_data][name]", &product_name),
            ("metadata[booking_id]", &req.booking_id),
            ("metadata[guest_email]", &req.guest_email),
        ];

        let resp = self
            .http
            .post(format!("{}/checkout/sessions", API_BASE))
            .bearer_auth(&self.api_key)
            .form(&form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(ApiError::Provider(format!(
                "Checkout session failed: {}",
                detail
            )));
        }

        let session: CheckoutSession = resp.json().await?;
        Ok(PaymentIntent {
            correlation_id: session.id,
            redirect_url: session.url,
            amount_minor,
            currency: req.currency.clone(),
            key_id: None,
        })
    }

    async fn verify_or_poll(&self, req: VerifyRequest) -> Result<PaymentOutcome, ApiError> {
        let session_id = match req {
            VerifyRequest::Poll { session_id } => session_id,
            VerifyRequest::Signed { .. } => {
                return Err(ApiError::InvalidRequest(
                    "Signature verification is not supported for this payment method".to_string(),
                ))
            }
        };
        let session = self.fetch_session(&session_id).await?;
        Ok(outcome_from_session(session))
    }

    async fn handle_callback(
        &self,
        body: &[u8],
        signature_header: &str,
    ) -> Result<PaymentOutcome, ApiError> {
        verify_webhook_signature(body, signature_header, &self.webhook_secret)?;

        let event: WebhookEvent = serde_json::from_slice(body)
            .map_err(|e| ApiError::InvalidRequest(format!("malformed webhook body: {}", e)))?;

        let paid = event.event_type == "checkout.session.completed"
            && event.data.object.payment_status.as_deref() == Some("paid");

        Ok(PaymentOutcome {
            correlation_id: event.data.object.id,
            paid,
            payment_id: None,
            signature: None,
            payment_status: event.data.object.payment_status,
            session_status: None,
            amount_minor: None,
            currency: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_header(body: &[u8], secret: &str, timestamp: i64) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn parses_signature_header() {
        let (t, v1) = parse_signature_header("t=1609459200,v1=abcdef").unwrap();
        assert_eq!(t, 1609459200);
        assert_eq!(v1, "abcdef");
    }

    #[test]
    fn rejects_malformed_header() {
        assert!(parse_signature_header("garbage").is_err());
        assert!(parse_signature_header("t=notanumber,v1=aa").is_err());
    }

    #[test]
    fn accepts_valid_webhook_signature() {
        let body = br#"{"type":"checkout.session.completed"}"#;
        let now = chrono::Utc::now().timestamp();
        let header = signed_header(body, "whsec_test", now);
        assert!(verify_webhook_signature(body, &header, "whsec_test").is_ok());
    }

    #[test]
    fn rejects_tampered_body() {
        let now = chrono::Utc::now().timestamp();
        let header = signed_header(b"original", "whsec_test", now);
        assert!(verify_webhook_signature(b"tampered", &header, "whsec_test").is_err());
    }

    #[test]
    fn rejects_stale_timestamp() {
        let body = b"payload";
        let stale = chrono::Utc::now().timestamp() - 3600;
        let header = signed_header(body, "whsec_test", stale);
        assert!(verify_webhook_signature(body, &header, "whsec_test").is_err());
    }

    #[actix_rt::test]
    async fn callback_marks_completed_paid_sessions() {
        let provider = StripeProvider::new("sk_test".into(), "whsec_test".into());
        let body = br#"{"type":"checkout.session.completed","data":{"object":{"id":"cs_1","payment_status":"paid"}}}"#;
        let header = signed_header(body, "whsec_test", chrono::Utc::now().timestamp());

        let outcome = provider.handle_callback(body, &header).await.unwrap();
        assert!(outcome.paid);
        assert_eq!(outcome.correlation_id, "cs_1");
    }

    #[actix_rt::test]
    async fn callback_ignores_other_event_types() {
        let provider = StripeProvider::new("sk_test".into(), "whsec_test".into());
        let body = br#"{"type":"payment_intent.created","data":{"object":{"id":"cs_2","payment_status":"unpaid"}}}"#;
        let header = signed_header(body, "whsec_test", chrono::Utc::now().timestamp());

        let outcome = provider.handle_callback(body, &header).await.unwrap();
        assert!(!outcome.paid);
    }
}
