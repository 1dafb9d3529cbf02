use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Единый тип ошибок приложения. Клиенту уходит { success: false, message },
/// подробности внутренних ошибок остаются в логах.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    // Место перехвачено другой бронью между проверкой и записью
    #[error("{0}")]
    SeatTaken(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Не найдено")]
    NotFound,

    #[error("Требуется вход в систему")]
    Unauthorized,

    #[error("Не удалось сгенерировать уникальный код бронирования")]
    CodeGeneration,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Password hash error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            // Оригинальный API отдаёт 400 и на занятое место
            AppError::SeatTaken(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::CodeGeneration => {
                tracing::error!("booking code generation exhausted");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Внутренняя ошибка сервера".to_string(),
                )
            }
            AppError::Template(e) => {
                tracing::error!("template error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Внутренняя ошибка сервера".to_string(),
                )
            }
            AppError::PasswordHash(e) => {
                tracing::error!("bcrypt error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Внутренняя ошибка сервера".to_string(),
                )
            }
        };

        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
