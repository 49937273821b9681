use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::ApiError;

pub async fn get_db_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

/// Inserts the sample rooms on first start. No-op once any room exists.
pub async fn seed_rooms(pool: &SqlitePool) -> Result<(), ApiError> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    let samples: [(&str, &str, f64, i64, &[&str], &str); 3] = [
        (
            "Deluxe King Suite",
            "Spacious suite with king-size bed, stunning city views, and premium amenities. \
             Perfect for couples seeking luxury and comfort.",
            299.0,
            2,
            &["King Bed", "City View", "WiFi", "Mini Bar", "Air Conditioning", "Smart TV"],
            "https://images.unsplash.com/photo-1629140727571-9b5c6f6267b4",
        ),
        (
            "Ocean View Suite",
            "Breathtaking ocean views with a private balcony, perfect for watching sunsets. \
             Includes luxury bedding and spa-like bathroom.",
            399.0,
            2,
            &["Ocean View", "Private Balcony", "WiFi", "Jacuzzi", "Coffee Maker", "Smart TV"],
            "https://images.unsplash.com/photo-1766928210443-0be92ed5884a",
        ),
        (
            "Standard Double Room",
            "Comfortable and elegant room with two double beds, ideal for families or friends \
             traveling together.",
            199.0,
            4,
            &["Two Double Beds", "WiFi", "Air Conditioning", "TV", "Work Desk"],
            "https://images.unsplash.com/photo-1759264244764-2cb80f1a67bd",
        ),
    ];

    for (name, description, price, max_guests, amenities, image) in samples {
        let amenities: Vec<String> = amenities.iter().map(|s| s.to_string()).collect();
        sqlx::query(
            r#"
            INSERT INTO rooms (id, name, description, price_per_night, max_guests, amenities, images, available)
            VALUES (?, ?, ?, ?, ?, ?, ?, 1)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(max_guests)
        .bind(serde_json::to_string(&amenities).unwrap_or_default())
        .bind(serde_json::to_string(&[image]).unwrap_or_default())
        .execute(pool)
        .await?;
    }

    log::info!("seeded {} sample rooms", samples.len());
    Ok(())
}
