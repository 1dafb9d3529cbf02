use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::{Validate, ValidationErrors};

use crate::error::{AppError, Result};
use crate::middleware::{self, AuthUser};
use crate::models::{BookingDetails, Notification, User};
use crate::services::{accounts, booking};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", get(register_page).post(register_submit))
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", get(logout))
        .route("/profile", get(profile_page))
        .route("/profile/update", post(profile_update))
}

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/notifications", get(api_notifications))
        .route("/notifications/mark-read/{id}", post(api_mark_read))
}

/* ---------- шаблоны ---------- */

#[derive(Template)]
#[template(path = "register.html")]
struct RegisterTemplate {
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "profile.html")]
struct ProfileTemplate {
    user: User,
    bookings: Vec<BookingDetails>,
    notifications: Vec<Notification>,
}

/* ---------- регистрация и вход ---------- */

#[derive(Debug, Deserialize, Validate)]
struct RegisterForm {
    #[validate(email(message = "Некорректный формат email"))]
    email: String,
    #[validate(length(min = 3, message = "Имя пользователя должно содержать минимум 3 символа"))]
    username: String,
    #[validate(length(min = 6, message = "Пароль должен содержать минимум 6 символов"))]
    password: String,
    full_name: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    email: String,
    password: String,
}

// Первое сообщение из отчёта валидатора
fn first_validation_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .into_values()
        .flatten()
        .filter_map(|e| e.message.as_ref())
        .map(|m| m.to_string())
        .next()
        .unwrap_or_else(|| "Некорректные данные формы".to_string())
}

async fn register_page() -> Response {
    super::render(RegisterTemplate { error: None })
}

async fn register_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    if let Err(errors) = form.validate() {
        let template = RegisterTemplate {
            error: Some(first_validation_message(&errors)),
        };
        return match template.render() {
            Ok(html) => (StatusCode::BAD_REQUEST, Html(html)).into_response(),
            Err(_) => super::server_error(),
        };
    }

    let password_hash = match bcrypt::hash(&form.password, bcrypt::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("bcrypt error: {:?}", e);
            return super::server_error();
        }
    };

    let created = accounts::create_user(
        &state.db.pool,
        &form.email,
        &form.username,
        &password_hash,
        normalize(form.full_name).as_deref(),
        normalize(form.phone).as_deref(),
    )
    .await;

    let user_id = match created {
        Ok(id) => id,
        Err(AppError::Conflict(msg)) => {
            let template = RegisterTemplate { error: Some(msg) };
            return match template.render() {
                Ok(html) => (StatusCode::CONFLICT, Html(html)).into_response(),
                Err(_) => super::server_error(),
            };
        }
        Err(e) => {
            tracing::error!("Ошибка регистрации: {:?}", e);
            return super::server_error();
        }
    };

    // Приветственное уведомление; его сбой регистрацию не ломает
    if let Err(e) = accounts::add_notification(
        &state.db.pool,
        user_id,
        "system",
        "Добро пожаловать!",
        "Спасибо, что пользуетесь нашим кинотеатром.",
    )
    .await
    {
        tracing::warn!("Не удалось создать приветственное уведомление: {:?}", e);
    }

    start_session(&state, jar, &form.email).await
}

async fn login_page() -> Response {
    super::render(LoginTemplate { error: None })
}

async fn login_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let user = match accounts::get_user_by_email(&state.db.pool, &form.email).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("Ошибка входа: {:?}", e);
            return super::server_error();
        }
    };

    match user {
        Some(user) if user.verify_password(&form.password) => {
            start_session(&state, jar, &user.email).await
        }
        _ => {
            let template = LoginTemplate {
                error: Some("Неверный email или пароль".to_string()),
            };
            match template.render() {
                Ok(html) => (StatusCode::UNAUTHORIZED, Html(html)).into_response(),
                Err(_) => super::server_error(),
            }
        }
    }
}

// Выписать куку и уйти в кабинет
async fn start_session(state: &AppState, jar: CookieJar, email: &str) -> Response {
    let user = match accounts::get_user_by_email(&state.db.pool, email).await {
        Ok(Some(user)) => user,
        _ => return super::server_error(),
    };

    match middleware::create_session_token(&user, &state.config.auth) {
        Ok(token) => {
            let jar = jar.add(middleware::session_cookie(token));
            (jar, Redirect::to("/profile")).into_response()
        }
        Err(e) => {
            tracing::error!("Ошибка выпуска сессионного токена: {:?}", e);
            super::server_error()
        }
    }
}

async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(middleware::removal_cookie());
    (jar, Redirect::to("/"))
}

/* ---------- кабинет ---------- */

async fn profile_page(State(state): State<Arc<AppState>>, auth: AuthUser) -> Response {
    let user = match accounts::get_user_by_id(&state.db.pool, auth.id).await {
        Ok(Some(user)) => user,
        Ok(None) => return super::not_found(),
        Err(e) => {
            tracing::error!("Ошибка загрузки профиля: {:?}", e);
            return super::server_error();
        }
    };

    let bookings = booking::get_user_bookings(&state.db.pool, auth.id)
        .await
        .unwrap_or_default();
    let notifications = accounts::get_user_notifications(&state.db.pool, auth.id, false)
        .await
        .unwrap_or_default();

    super::render(ProfileTemplate {
        user,
        bookings,
        notifications,
    })
}

#[derive(Debug, Deserialize)]
struct ProfileUpdateForm {
    full_name: Option<String>,
    phone: Option<String>,
}

// Пустые поля формы означают "не менять"
fn normalize(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

async fn profile_update(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Form(form): Form<ProfileUpdateForm>,
) -> Response {
    let update = accounts::ProfileUpdate {
        full_name: normalize(form.full_name),
        phone: normalize(form.phone),
    };

    if let Err(e) = accounts::update_profile(&state.db.pool, auth.id, update).await {
        tracing::error!("Ошибка обновления профиля: {:?}", e);
        return super::server_error();
    }
    Redirect::to("/profile").into_response()
}

/* ---------- уведомления ---------- */

#[derive(Debug, Deserialize)]
struct NotificationsQuery {
    #[serde(default)]
    unread_only: bool,
}

// GET /api/notifications
async fn api_notifications(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(params): Query<NotificationsQuery>,
) -> Result<Json<Vec<Notification>>> {
    let notifications =
        accounts::get_user_notifications(&state.db.pool, auth.id, params.unread_only).await?;
    Ok(Json(notifications))
}

// POST /api/notifications/mark-read/{id}
async fn api_mark_read(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    if accounts::mark_notification_read(&state.db.pool, id, auth.id).await? {
        Ok(Json(json!({ "success": true, "message": "Уведомление прочитано" })).into_response())
    } else {
        Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "Уведомление не найдено" })),
        )
            .into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_form_rejects_bad_email_and_short_password() {
        let form = RegisterForm {
            email: "not-an-email".into(),
            username: "anna".into(),
            password: "123".into(),
            full_name: None,
            phone: None,
        };
        let errors = form.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn register_form_accepts_valid_input() {
        let form = RegisterForm {
            email: "anna.petrova@gmail.com".into(),
            username: "anna".into(),
            password: "anna123".into(),
            full_name: Some("Анна Петрова".into()),
            phone: None,
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn blank_form_fields_mean_no_change() {
        assert_eq!(normalize(Some("".into())), None);
        assert_eq!(normalize(Some("   ".into())), None);
        assert_eq!(normalize(None), None);
        assert_eq!(normalize(Some(" Анна ".into())), Some("Анна".into()));
    }
}
