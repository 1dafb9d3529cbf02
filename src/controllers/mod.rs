pub mod account;
pub mod bookings;
pub mod films;

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Router,
};
use std::sync::Arc;

// HTML-страницы
pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(films::routes())
        .merge(bookings::routes())
        .merge(account::routes())
}

// JSON API, монтируется под /api
pub fn api_routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(films::api_routes())
        .merge(bookings::api_routes())
        .merge(account::api_routes())
}

#[derive(Template)]
#[template(path = "404.html")]
struct NotFoundTemplate;

#[derive(Template)]
#[template(path = "500.html")]
struct ServerErrorTemplate;

pub(crate) fn render<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("template error: {:?}", e);
            server_error()
        }
    }
}

pub(crate) fn not_found() -> Response {
    let html = NotFoundTemplate.render().unwrap_or_default();
    (StatusCode::NOT_FOUND, Html(html)).into_response()
}

pub(crate) fn server_error() -> Response {
    let html = ServerErrorTemplate.render().unwrap_or_default();
    (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response()
}

// Фолбэк для несуществующих страниц
pub async fn fallback_404() -> Response {
    not_found()
}
