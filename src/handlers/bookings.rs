use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use crate::errors::ApiError;
use crate::models::booking::{
    new_booking_code, quote, stay_nights, Booking, BookingStatus, CreateBooking, ModifyBooking,
    VerifyBooking,
};
use crate::models::room::Room;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

pub async fn create_booking(
    state: web::Data<AppState>,
    body: web::Json<CreateBooking>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    let room = sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = ?")
        .bind(&body.room_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Room not found".to_string()))?;

    if !room.available {
        return Err(ApiError::Unavailable("Room not available".to_string()));
    }

    let nights = stay_nights(&body.check_in, &body.check_out)?;
    let (subtotal, tax, total_amount) = quote(room.price_per_night, nights);

    let booking = Booking {
        booking_id: new_booking_code(),
        room_id: body.room_id.clone(),
        room_name: room.name.clone(),
        guest_name: body.guest_name.clone(),
        guest_email: body.guest_email.clone(),
        guest_phone: body.guest_phone.clone(),
        check_in: body.check_in.clone(),
        check_out: body.check_out.clone(),
        guests: body.guests,
        total_nights: nights,
        price_per_night: room.price_per_night,
        subtotal,
        tax,
        total_amount,
        status: BookingStatus::Pending,
        payment_status: None,
        special_requests: body.special_requests.clone(),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO bookings (booking_id, room_id, room_name, guest_name, guest_email,
            guest_phone, check_in, check_out, guests, total_nights, price_per_night,
            subtotal, tax, total_amount, status, payment_status, special_requests, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&booking.booking_id)
    .bind(&booking.room_id)
    .bind(&booking.room_name)
    .bind(&booking.guest_name)
    .bind(&booking.guest_email)
    .bind(&booking.guest_phone)
    .bind(&booking.check_in)
    .bind(&booking.check_out)
    .bind(booking.guests)
    .bind(booking.total_nights)
    .bind(booking.price_per_night)
    .bind(booking.subtotal)
    .bind(booking.tax)
    .bind(booking.total_amount)
    .bind(booking.status)
    .bind(&booking.payment_status)
    .bind(&booking.special_requests)
    .bind(booking.created_at)
    .execute(&state.pool)
    .await?;

    log::info!(
        "booking {} created for room {} ({} nights)",
        booking.booking_id,
        booking.room_id,
        nights
    );
    Ok(HttpResponse::Created().json(booking))
}

pub async fn verify_booking(
    state: web::Data<AppState>,
    body: web::Json<VerifyBooking>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let booking = find_booking(&state.pool, &body.booking_id, &body.email).await?;
    Ok(HttpResponse::Ok().json(booking))
}

pub async fn get_booking(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<EmailQuery>,
) -> Result<HttpResponse, ApiError> {
    let booking = find_booking(&state.pool, &path.into_inner(), &query.email).await?;
    Ok(HttpResponse::Ok().json(booking))
}

pub async fn modify_booking(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<EmailQuery>,
    body: web::Json<ModifyBooking>,
) -> Result<HttpResponse, ApiError> {
    let booking_id = path.into_inner();
    let booking = find_booking(&state.pool, &booking_id, &query.email).await?;

    if booking.status == BookingStatus::Cancelled {
        return Err(ApiError::InvalidState(
            "Cannot modify cancelled booking".to_string(),
        ));
    }

    // Pricing stays a snapshot of booking time even when dates change.
    sqlx::query(
        r#"
        UPDATE bookings
        SET check_in = COALESCE(?, check_in),
            check_out = COALESCE(?, check_out),
            guests = COALESCE(?, guests),
            special_requests = COALESCE(?, special_requests)
        WHERE booking_id = ?
        "#,
    )
    .bind(&body.check_in)
    .bind(&body.check_out)
    .bind(body.guests)
    .bind(&body.special_requests)
    .bind(&booking_id)
    .execute(&state.pool)
    .await?;

    let updated = find_booking(&state.pool, &booking_id, &query.email).await?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn cancel_booking(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<EmailQuery>,
) -> Result<HttpResponse, ApiError> {
    let booking_id = path.into_inner();
    find_booking(&state.pool, &booking_id, &query.email).await?;

    sqlx::query("UPDATE bookings SET status = 'cancelled' WHERE booking_id = ?")
        .bind(&booking_id)
        .execute(&state.pool)
        .await?;

    log::info!("booking {} cancelled by guest", booking_id);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Booking cancelled successfully"
    })))
}

/// Lookup requires the matching guest email, so booking codes alone cannot
/// be enumerated.
pub async fn find_booking(
    pool: &sqlx::SqlitePool,
    booking_id: &str,
    email: &str,
) -> Result<Booking, ApiError> {
    sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE booking_id = ? AND guest_email = ?")
        .bind(booking_id)
        .bind(email)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))
}
