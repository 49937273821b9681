use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::booking::Booking;
use crate::models::payment::PaymentMethod;
use crate::payments::{reconcile, IntentRequest, PaymentIntent, VerifyRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrder {
    pub booking_id: String,
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct RazorpayCallback {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub booking_id: String,
    pub origin_url: Option<String>,
}

async fn require_booking(state: &AppState, booking_id: &str) -> Result<Booking, ApiError> {
    sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE booking_id = ?")
        .bind(booking_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))
}

async fn record_transaction(
    state: &AppState,
    booking_id: &str,
    intent: &PaymentIntent,
    amount: f64,
    method: PaymentMethod,
) -> Result<(), ApiError> {
    sqlx::query(
        r#"
        INSERT INTO payment_transactions (transaction_id, booking_id, correlation_id,
            amount, currency, payment_method, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(booking_id)
    .bind(&intent.correlation_id)
    .bind(amount)
    .bind(&intent.currency)
    .bind(method)
    .bind(Utc::now())
    .execute(&state.pool)
    .await?;
    Ok(())
}

/// Direct flow, step 1: open a provider order for the given amount.
pub async fn create_razorpay_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrder>,
) -> Result<HttpResponse, ApiError> {
    require_booking(&state, &body.booking_id).await?;

    let intent = state
        .razorpay
        .create_intent(&IntentRequest {
            booking_id: body.booking_id.clone(),
            guest_email: String::new(),
            amount: body.amount,
            currency: body.currency.clone(),
            origin_url: None,
        })
        .await?;

    record_transaction(
        &state,
        &body.booking_id,
        &intent,
        body.amount,
        PaymentMethod::Razorpay,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "order_id": intent.correlation_id,
        "amount": intent.amount_minor,
        "currency": intent.currency,
        "key_id": intent.key_id,
    })))
}

/// Direct flow, step 2: signature-check the client's callback payload and
/// reconcile on success.
pub async fn verify_razorpay_payment(
    state: web::Data<AppState>,
    body: web::Json<RazorpayCallback>,
) -> Result<HttpResponse, ApiError> {
    let outcome = state
        .razorpay
        .verify_or_poll(VerifyRequest::Signed {
            order_id: body.razorpay_order_id.clone(),
            payment_id: body.razorpay_payment_id.clone(),
            signature: body.razorpay_signature.clone(),
        })
        .await?;

    reconcile(&state.pool, &outcome).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "success" })))
}

/// Hosted flow, step 1: open a checkout session. The charge amount comes
/// from the stored booking total, never from the request body.
pub async fn create_stripe_checkout(
    state: web::Data<AppState>,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, ApiError> {
    let booking = require_booking(&state, &body.booking_id).await?;

    let intent = state
        .stripe
        .create_intent(&IntentRequest {
            booking_id: booking.booking_id.clone(),
            guest_email: booking.guest_email.clone(),
            amount: booking.total_amount,
            currency: "usd".to_string(),
            origin_url: body.origin_url.clone(),
        })
        .await?;

    record_transaction(
        &state,
        &booking.booking_id,
        &intent,
        booking.total_amount,
        PaymentMethod::Stripe,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "url": intent.redirect_url,
        "session_id": intent.correlation_id,
    })))
}

/// Hosted flow: poll the session. Safe to call repeatedly; reconciliation
/// only fires on the pending-to-completed edge.
pub async fn stripe_payment_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let session_id = path.into_inner();
    let outcome = state
        .stripe
        .verify_or_poll(VerifyRequest::Poll {
            session_id: session_id.clone(),
        })
        .await?;

    reconcile(&state.pool, &outcome).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "session_id": outcome.correlation_id,
        "status": outcome.session_status,
        "payment_status": outcome.payment_status,
        "amount_total": outcome.amount_minor,
        "currency": outcome.currency,
    })))
}

/// Hosted flow: asynchronous provider callback. Unknown session ids are
/// acknowledged, not failed, so out-of-order or foreign events are harmless.
pub async fn stripe_webhook(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let signature = req
        .headers()
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Verification("missing Stripe-Signature header".to_string()))?;

    let outcome = state.stripe.handle_callback(&body, signature).await?;
    reconcile(&state.pool, &outcome).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "success" })))
}
