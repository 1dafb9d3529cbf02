use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::models::User;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub is_admin: bool,
}

// Полезная нагрузка сессионного токена
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i64,
    email: String,
    exp: i64,
}

/// Выписать сессионный токен для куки
pub fn create_session_token(
    user: &User,
    auth: &AuthConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        exp: (Utc::now() + chrono::Duration::hours(auth.session_ttl_hours)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.secret_key.as_bytes()),
    )
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .build()
}

// Неавторизованных отправляем на страницу входа
pub struct AuthRedirect;

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        Redirect::to("/login").into_response()
    }
}

async fn user_from_cookie(
    parts: &mut Parts,
    state: &Arc<crate::AppState>,
) -> Option<AuthUser> {
    let jar = CookieJar::from_headers(&parts.headers);
    let token = jar.get(SESSION_COOKIE)?.value().to_string();

    let claims = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(state.config.auth.secret_key.as_bytes()),
        &Validation::default(),
    )
    .ok()?
    .claims;

    // Токен валиден, но пользователь мог быть удалён
    let user = crate::services::accounts::get_user_by_id(&state.db.pool, claims.sub)
        .await
        .ok()
        .flatten()?;

    Some(AuthUser {
        id: user.id,
        email: user.email,
        username: user.username,
        is_admin: user.is_admin,
    })
}

// Сессионная кука обязательна
impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = AuthRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        user_from_cookie(parts, state).await.ok_or(AuthRedirect)
    }
}

// Вариант для страниц, доступных и без входа
impl OptionalFromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(user_from_cookie(parts, state).await)
    }
}
