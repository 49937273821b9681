use actix_web::{web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ApiError;
use crate::models::room::{CreateRoom, Room, UpdateRoom};
use crate::AppState;

pub async fn get_rooms(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rooms = sqlx::query_as::<_, Room>("SELECT * FROM rooms")
        .fetch_all(&state.pool)
        .await?;
    Ok(HttpResponse::Ok().json(rooms))
}

pub async fn get_room(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let room = find_room(&state.pool, &id).await?;
    Ok(HttpResponse::Ok().json(room))
}

pub async fn create_room(
    state: web::Data<AppState>,
    body: web::Json<CreateRoom>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO rooms (id, name, description, price_per_night, max_guests, amenities, images, available)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&body.name)
    .bind(&body.description)
    .bind(body.price_per_night)
    .bind(body.max_guests)
    .bind(serde_json::to_string(&body.amenities).unwrap_or_default())
    .bind(serde_json::to_string(&body.images).unwrap_or_default())
    .bind(body.available)
    .execute(&state.pool)
    .await?;

    let room = find_room(&state.pool, &id).await?;
    Ok(HttpResponse::Created().json(room))
}

/// Partial update shared by the admin endpoint; absent fields keep their
/// current value.
pub async fn update_room(
    pool: &sqlx::SqlitePool,
    room_id: &str,
    update: &UpdateRoom,
) -> Result<Room, ApiError> {
    sqlx::query(
        r#"
        UPDATE rooms
        SET price_per_night = COALESCE(?, price_per_night),
            available = COALESCE(?, available)
        WHERE id = ?
        "#,
    )
    .bind(update.price_per_night)
    .bind(update.available)
    .bind(room_id)
    .execute(pool)
    .await?;

    find_room(pool, room_id).await
}

pub async fn find_room(pool: &sqlx::SqlitePool, room_id: &str) -> Result<Room, ApiError> {
    sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = ?")
        .bind(room_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Room not found".to_string()))
}
