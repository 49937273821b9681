use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::errors::ApiError;
use crate::handlers::rooms::update_room;
use crate::models::booking::Booking;
use crate::models::room::UpdateRoom;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AdminLogin {
    pub username: String,
    pub password: String,
}

/// Exact match against configured credentials. No session or token is
/// issued; subsequent admin calls are not authenticated.
pub async fn admin_login(
    state: web::Data<AppState>,
    body: web::Json<AdminLogin>,
) -> Result<HttpResponse, ApiError> {
    if body.username == state.config.admin_username && body.password == state.config.admin_password
    {
        return Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Login successful"
        })));
    }
    Err(ApiError::Unauthorized)
}

pub async fn list_all_bookings(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let bookings = sqlx::query_as::<_, Booking>("SELECT * FROM bookings")
        .fetch_all(&state.pool)
        .await?;
    Ok(HttpResponse::Ok().json(bookings))
}

pub async fn admin_update_room(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateRoom>,
) -> Result<HttpResponse, ApiError> {
    let room = update_room(&state.pool, &path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(room))
}

/// Unconditional cancel, bypassing the guest-email ownership check.
pub async fn admin_cancel_booking(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let booking_id = path.into_inner();
    sqlx::query("UPDATE bookings SET status = 'cancelled' WHERE booking_id = ?")
        .bind(&booking_id)
        .execute(&state.pool)
        .await?;

    log::info!("booking {} cancelled by admin", booking_id);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Booking cancelled successfully"
    })))
}
