use actix_web::{web, HttpResponse};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ApiError;
use crate::models::contact::ContactForm;
use crate::AppState;

pub async fn submit_contact(
    state: web::Data<AppState>,
    body: web::Json<ContactForm>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    sqlx::query(
        "INSERT INTO contacts (id, name, email, phone, message, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&body.name)
    .bind(&body.email)
    .bind(&body.phone)
    .bind(&body.message)
    .bind(Utc::now())
    .execute(&state.pool)
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Thank you for contacting us! We'll get back to you soon."
    })))
}
