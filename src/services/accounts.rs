use sqlx::PgPool;
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::{Notification, User};

/// Создать пользователя. Уникальность email и username обеспечивает БД;
/// по имени нарушенного ограничения различаем, что именно занято.
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    username: &str,
    password_hash: &str,
    full_name: Option<&str>,
    phone: Option<&str>,
) -> Result<i64> {
    let inserted = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (email, username, password_hash, full_name, phone)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(email)
    .bind(username)
    .bind(password_hash)
    .bind(full_name)
    .bind(phone)
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(id) => {
            info!("Зарегистрирован пользователь {} ({})", username, email);
            Ok(id)
        }
        Err(e) => Err(map_unique_violation(e)),
    }
}

fn map_unique_violation(err: sqlx::Error) -> AppError {
    match err.as_database_error().and_then(|db| db.constraint()) {
        Some("users_email_key") => {
            AppError::Conflict("Пользователь с таким email уже существует".into())
        }
        Some("users_username_key") => {
            AppError::Conflict("Пользователь с таким именем уже существует".into())
        }
        _ => err.into(),
    }
}

pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn get_user_by_id(pool: &PgPool, user_id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Частичное обновление профиля: None - оставить поле как есть
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.phone.is_none()
    }
}

pub async fn update_profile(pool: &PgPool, user_id: i64, update: ProfileUpdate) -> Result<bool> {
    if update.is_empty() {
        return Ok(false);
    }

    let result = sqlx::query(
        r#"
        UPDATE users
        SET full_name = COALESCE($2, full_name),
            phone = COALESCE($3, phone)
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(update.full_name)
    .bind(update.phone)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn add_notification(
    pool: &PgPool,
    user_id: i64,
    notification_type: &str,
    title: &str,
    message: &str,
) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO notifications (user_id, type, title, message)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(notification_type)
    .bind(title)
    .bind(message)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Уведомления пользователя: либо только непрочитанные, либо все
/// (непрочитанные первыми, не больше 50)
pub async fn get_user_notifications(
    pool: &PgPool,
    user_id: i64,
    unread_only: bool,
) -> Result<Vec<Notification>> {
    let notifications = if unread_only {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1 AND is_read = FALSE
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1
            ORDER BY is_read ASC, created_at DESC
            LIMIT 50
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?
    };
    Ok(notifications)
}

/// Пометить прочитанным; чужое уведомление не трогаем
pub async fn mark_notification_read(pool: &PgPool, id: i64, user_id: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_update_is_detected() {
        assert!(ProfileUpdate::default().is_empty());
        assert!(!ProfileUpdate {
            full_name: Some("Анна Петрова".into()),
            phone: None,
        }
        .is_empty());
        assert!(!ProfileUpdate {
            full_name: None,
            phone: Some("+380501112233".into()),
        }
        .is_empty());
    }
}
