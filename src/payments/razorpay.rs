//! Direct payment flow: a server-side order is created up front, the client
//! pays synchronously in the provider widget and posts back a signed
//! (order_id, payment_id) pair for verification.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::errors::ApiError;
use crate::models::payment::PaymentMethod;

use super::{IntentRequest, PaymentIntent, PaymentOutcome, PaymentProvider, VerifyRequest};

const API_BASE: &str = "https://api.razorpay.com/v1";

pub struct RazorpayProvider {
    http: reqwest::Client,
    key_id: String,
    key_secret: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    amount: i64,
    currency: String,
}

impl RazorpayProvider {
    pub fn new(key_id: String, key_secret: String) -> Self {
        RazorpayProvider {
            http: reqwest::Client::new(),
            key_id,
            key_secret,
        }
    }
}

/// HMAC-SHA256 over "order_id|payment_id", hex-encoded. This is the payload
/// the provider signs when the client completes payment.
fn sign_payload(order_id: &str, payment_id: &str, secret: &str) -> Result<String, ApiError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| ApiError::Verification("invalid signing key".to_string()))?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn verify_signature(
    order_id: &str,
    payment_id: &str,
    signature: &str,
    secret: &str,
) -> Result<bool, ApiError> {
    let expected = sign_payload(order_id, payment_id, secret)?;
    Ok(expected.as_bytes().ct_eq(signature.as_bytes()).into())
}

#[async_trait]
impl PaymentProvider for RazorpayProvider {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Razorpay
    }

    async fn create_intent(&self, req: &IntentRequest) -> Result<PaymentIntent, ApiError> {
        let amount_minor = (req.amount * 100.0).round() as i64;
        let body = json!({
            "amount": amount_minor,
            "currency": req.currency,
            "payment_capture": 1,
            "notes": { "booking_id": req.booking_id },
        });

        let resp = self
            .http
            .post(format!("{}/orders", API_BASE))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(ApiError::Provider(format!(
                "Payment creation failed: {}",
                detail
            )));
        }

        let order: OrderResponse = resp.json().await?;
        Ok(PaymentIntent {
            correlation_id: order.id,
            redirect_url: None,
            amount_minor: order.amount,
            currency: order.currency,
            key_id: Some(self.key_id.clone()),
        })
    }

    async fn verify_or_poll(&self, req: VerifyRequest) -> Result<PaymentOutcome, ApiError> {
        let (order_id, payment_id, signature) = match req {
            VerifyRequest::Signed {
                order_id,
                payment_id,
                signature,
            } => (order_id, payment_id, signature),
            VerifyRequest::Poll { .. } => {
                return Err(ApiError::InvalidRequest(
                    "Polling is not supported for this payment method".to_string(),
                ))
            }
        };

        if !verify_signature(&order_id, &payment_id, &signature, &self.key_secret)? {
            return Err(ApiError::Verification("signature mismatch".to_string()));
        }

        Ok(PaymentOutcome {
            correlation_id: order_id,
            paid: true,
            payment_id: Some(payment_id),
            signature: Some(signature),
            payment_status: None,
            session_status: None,
            amount_minor: None,
            currency: None,
        })
    }

    async fn handle_callback(&self, _body: &[u8], _sig: &str) -> Result<PaymentOutcome, ApiError> {
        Err(ApiError::InvalidRequest(
            "No webhook endpoint for this payment method".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_signature() {
        let sig = sign_payload("order_abc", "pay_def", "secret").unwrap();
        assert!(verify_signature("order_abc", "pay_def", &sig, "secret").unwrap());
    }

    #[test]
    fn rejects_tampered_payment_id() {
        let sig = sign_payload("order_abc", "pay_def", "secret").unwrap();
        assert!(!verify_signature("order_abc", "pay_OTHER", &sig, "secret").unwrap());
    }

    #[test]
    fn rejects_wrong_secret() {
        let sig = sign_payload("order_abc", "pay_def", "secret").unwrap();
        assert!(!verify_signature("order_abc", "pay_def", &sig, "other-secret").unwrap());
    }

    #[actix_rt::test]
    async fn verify_rejects_bad_signature_as_verification_error() {
        let provider = RazorpayProvider::new("key".into(), "secret".into());
        let result = provider
            .verify_or_poll(VerifyRequest::Signed {
                order_id: "order_abc".to_string(),
                payment_id: "pay_def".to_string(),
                signature: "deadbeef".to_string(),
            })
            .await;
        assert!(matches!(result, Err(ApiError::Verification(_))));
    }
}
