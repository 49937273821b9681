use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_per_night: f64,
    pub max_guests: i64,
    pub amenities: Json<Vec<String>>,
    pub images: Json<Vec<String>>,
    pub available: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoom {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: String,
    #[validate(range(min = 0.0))]
    pub price_per_night: f64,
    #[validate(range(min = 1))]
    pub max_guests: i64,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

/// Partial admin update; absent fields are left untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateRoom {
    pub price_per_night: Option<f64>,
    pub available: Option<bool>,
}
