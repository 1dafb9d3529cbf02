use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub film_id: i64,
    pub hall_id: i64,
    pub session_date: NaiveDate,
    pub session_time: NaiveTime,
    pub price: f64,
}

// Сеанс с данными фильма и зала для страницы выбора мест
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SessionDetails {
    pub id: i64,
    pub film_id: i64,
    pub hall_id: i64,
    pub session_date: NaiveDate,
    pub session_time: NaiveTime,
    pub price: f64,
    pub film_title: String,
    pub duration: i32,
    pub film_genre: Option<String>,
    pub hall_name: String,
    pub hall_type: String,
}

// Строка расписания на странице фильма
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FilmSession {
    pub id: i64,
    pub session_date: NaiveDate,
    pub session_time: NaiveTime,
    pub price: f64,
    pub hall_name: String,
    pub hall_type: String,
}
