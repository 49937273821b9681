use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub booking_id: String,
    pub room_id: String,
    pub room_name: String,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub check_in: String,
    pub check_out: String,
    pub guests: i64,
    pub total_nights: i64,
    pub price_per_night: f64,
    pub subtotal: f64,
    pub tax: f64,
    pub total_amount: f64,
    pub status: BookingStatus,
    pub payment_status: Option<String>,
    pub special_requests: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBooking {
    pub room_id: String,
    #[validate(length(min = 1))]
    pub guest_name: String,
    #[validate(email)]
    pub guest_email: String,
    pub guest_phone: String,
    pub check_in: String,
    pub check_out: String,
    #[validate(range(min = 1))]
    pub guests: i64,
    pub special_requests: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyBooking {
    pub booking_id: String,
    #[validate(email)]
    pub email: String,
}

/// Partial guest update. Dates do not trigger a price recomputation; the
/// price fields stay a snapshot of booking time.
#[derive(Debug, Deserialize)]
pub struct ModifyBooking {
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub guests: Option<i64>,
    pub special_requests: Option<String>,
}

/// Short uppercase booking code, e.g. "9F2A11BC".
pub fn new_booking_code() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates.
fn parse_stay_date(raw: &str) -> Result<NaiveDate, ApiError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::InvalidRequest("Invalid dates".to_string()))
}

/// Whole calendar nights between check-in and check-out. At least one night
/// is required for a booking to be valid.
pub fn stay_nights(check_in: &str, check_out: &str) -> Result<i64, ApiError> {
    let start = parse_stay_date(check_in)?;
    let end = parse_stay_date(check_out)?;
    let nights = (end - start).num_days();
    if nights < 1 {
        return Err(ApiError::InvalidRequest("Invalid dates".to_string()));
    }
    Ok(nights)
}

pub const TAX_RATE: f64 = 0.12;

/// Price breakdown snapshotted onto the booking record.
pub fn quote(price_per_night: f64, nights: i64) -> (f64, f64, f64) {
    let subtotal = price_per_night * nights as f64;
    let tax = subtotal * TAX_RATE;
    (subtotal, tax, subtotal + tax)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nights_from_plain_dates() {
        assert_eq!(stay_nights("2025-03-10", "2025-03-13").unwrap(), 3);
    }

    #[test]
    fn nights_from_rfc3339() {
        assert_eq!(
            stay_nights("2025-03-10T14:00:00Z", "2025-03-11T10:00:00Z").unwrap(),
            1
        );
    }

    #[test]
    fn rejects_checkout_before_checkin() {
        assert!(stay_nights("2025-03-13", "2025-03-10").is_err());
        assert!(stay_nights("2025-03-10", "2025-03-10").is_err());
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(stay_nights("not-a-date", "2025-03-10").is_err());
    }

    #[test]
    fn quote_applies_twelve_percent_tax() {
        let (subtotal, tax, total) = quote(199.0, 3);
        assert!((subtotal - 597.0).abs() < 1e-9);
        assert!((tax - 71.64).abs() < 1e-9);
        assert!((total - 668.64).abs() < 1e-9);
    }

    #[test]
    fn booking_code_is_short_and_upper() {
        let code = new_booking_code();
        assert_eq!(code.len(), 8);
        assert_eq!(code, code.to_uppercase());
    }
}
