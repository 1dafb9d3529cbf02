use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    pub hall_id: i64,
    pub row_number: i32,
    pub seat_number: i32,
}

// Место зала с признаком занятости для конкретного сеанса
#[derive(Debug, Clone, Serialize)]
pub struct SeatAvailability {
    pub id: i64,
    pub hall_id: i64,
    pub row_number: i32,
    pub seat_number: i32,
    pub is_available: bool,
}
