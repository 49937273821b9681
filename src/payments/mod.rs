//! Payment orchestration: one provider capability trait with a razorpay-style
//! direct implementation and a stripe-style hosted implementation, plus the
//! single reconciliation rule both flows funnel into.

pub mod razorpay;
pub mod stripe;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::errors::ApiError;
use crate::models::payment::PaymentMethod;

pub use razorpay::RazorpayProvider;
pub use stripe::StripeProvider;

/// Request to open a payment attempt for a booking.
#[derive(Debug, Clone)]
pub struct IntentRequest {
    pub booking_id: String,
    pub guest_email: String,
    /// Major units, e.g. 668.64. Converted to minor units at the provider
    /// boundary.
    pub amount: f64,
    pub currency: String,
    /// Base URL of the requesting frontend; used by the hosted flow to build
    /// success/cancel redirects.
    pub origin_url: Option<String>,
}

/// Provider handle for an opened payment attempt.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    /// Order id (direct flow) or checkout session id (hosted flow).
    pub correlation_id: String,
    /// Hosted payment page, when the provider has one.
    pub redirect_url: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    /// Publishable key the client needs to open the provider widget.
    pub key_id: Option<String>,
}

/// Input to `verify_or_poll`, shaped per flow.
#[derive(Debug, Clone)]
pub enum VerifyRequest {
    /// Direct flow: client-submitted payload, must be signature-checked.
    Signed {
        order_id: String,
        payment_id: String,
        signature: String,
    },
    /// Hosted flow: ask the provider for the session's current state.
    Poll { session_id: String },
}

/// Normalized result of a verification, poll, or webhook.
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    pub correlation_id: String,
    pub paid: bool,
    pub payment_id: Option<String>,
    pub signature: Option<String>,
    /// Provider-reported payment status string ("paid", "unpaid", ...).
    pub payment_status: Option<String>,
    /// Provider-reported session status, hosted flow only.
    pub session_status: Option<String>,
    pub amount_minor: Option<i64>,
    pub currency: Option<String>,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    fn method(&self) -> PaymentMethod;

    async fn create_intent(&self, req: &IntentRequest) -> Result<PaymentIntent, ApiError>;

    async fn verify_or_poll(&self, req: VerifyRequest) -> Result<PaymentOutcome, ApiError>;

    /// Asynchronous server-to-server callback (webhook). Only the hosted
    /// flow has one.
    async fn handle_callback(
        &self,
        body: &[u8],
        signature_header: &str,
    ) -> Result<PaymentOutcome, ApiError>;
}

/// Marks the transaction completed and its booking confirmed/paid. Written
/// once; both flows and all three completion paths (verify, poll, webhook)
/// call it.
///
/// The transaction update is conditional on `status = 'pending'`, so a
/// second completion for the same correlation id is a no-op, as is an
/// outcome for a correlation id we never recorded. Returns whether this call
/// performed the transition.
pub async fn reconcile(pool: &SqlitePool, outcome: &PaymentOutcome) -> Result<bool, ApiError> {
    if !outcome.paid {
        return Ok(false);
    }

    let updated = sqlx::query(
        r#"
        UPDATE payment_transactions
        SET status = 'completed',
            payment_id = COALESCE(?, payment_id),
            signature = COALESCE(?, signature),
            payment_status = COALESCE(?, payment_status)
        WHERE correlation_id = ? AND status = 'pending'
        "#,
    )
    .bind(&outcome.payment_id)
    .bind(&outcome.signature)
    .bind(&outcome.payment_status)
    .bind(&outcome.correlation_id)
    .execute(pool)
    .await?
    .rows_affected();

    if updated == 0 {
        return Ok(false);
    }

    let booking_id: Option<String> =
        sqlx::query_scalar("SELECT booking_id FROM payment_transactions WHERE correlation_id = ?")
            .bind(&outcome.correlation_id)
            .fetch_optional(pool)
            .await?;

    if let Some(booking_id) = booking_id {
        sqlx::query(
            "UPDATE bookings SET status = 'confirmed', payment_status = 'paid' WHERE booking_id = ?",
        )
        .bind(&booking_id)
        .execute(pool)
        .await?;
        log::info!("payment reconciled, booking {} confirmed", booking_id);
    }

    Ok(true)
}
