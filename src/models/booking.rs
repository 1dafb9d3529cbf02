use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_CANCELLED: &str = "cancelled";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub session_id: i64,
    pub customer_email: String,
    pub customer_name: String,
    pub booking_code: String,
    pub status: String,
    pub created_at: NaiveDateTime,
}

// Денормализованная бронь: сеанс + фильм + зал + метки мест "ряд-место"
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookingDetails {
    pub id: i64,
    pub session_id: i64,
    pub customer_email: String,
    pub customer_name: String,
    pub booking_code: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub session_date: NaiveDate,
    pub session_time: NaiveTime,
    pub film_id: i64,
    pub film_title: String,
    pub hall_name: String,
    pub seats: Vec<String>,
}
