use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Film {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration: i32,
    pub genre: Option<String>,
    pub poster_url: Option<String>,
    pub created_at: NaiveDateTime,
}
