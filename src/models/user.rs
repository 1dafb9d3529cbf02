use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub username: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: String,
    pub email_verified: bool,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
}

impl User {
    // Сверить пароль с bcrypt-хешем
    pub fn verify_password(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.password_hash).unwrap_or(false)
    }
}
