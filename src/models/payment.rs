use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentMethod {
    Razorpay,
    Stripe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
}

/// Audit record for one payment attempt. `correlation_id` is the provider's
/// handle: the order id for the direct flow, the checkout session id for the
/// hosted flow. Updated at most once, from pending to completed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentTransaction {
    pub transaction_id: String,
    pub booking_id: String,
    pub correlation_id: String,
    pub amount: f64,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
    pub payment_id: Option<String>,
    pub signature: Option<String>,
    pub payment_status: Option<String>,
    pub created_at: DateTime<Utc>,
}
