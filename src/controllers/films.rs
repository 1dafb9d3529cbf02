use askama::Template;
use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::{Film, FilmSession};
use crate::services::catalog;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/film/{film_id}", get(film_details))
}

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new().route("/films", get(api_films))
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    films: Vec<Film>,
}

#[derive(Template)]
#[template(path = "film.html")]
struct FilmTemplate {
    film: Film,
    sessions: Vec<FilmSession>,
}

// Главная страница с афишей
async fn index(State(state): State<Arc<AppState>>) -> Response {
    match catalog::get_films_with_sessions(&state.db.pool).await {
        Ok(films) => super::render(IndexTemplate { films }),
        Err(e) => {
            tracing::error!("Ошибка получения фильмов: {:?}", e);
            super::server_error()
        }
    }
}

// Страница фильма с расписанием сеансов
async fn film_details(State(state): State<Arc<AppState>>, Path(film_id): Path<i64>) -> Response {
    let film = match catalog::get_film_by_id(&state.db.pool, film_id).await {
        Ok(Some(film)) => film,
        Ok(None) => return super::not_found(),
        Err(e) => {
            tracing::error!("Ошибка получения фильма {}: {:?}", film_id, e);
            return super::server_error();
        }
    };

    match catalog::get_unique_sessions_for_film(&state.db.pool, film_id).await {
        Ok(sessions) => super::render(FilmTemplate { film, sessions }),
        Err(e) => {
            tracing::error!("Ошибка получения сеансов фильма {}: {:?}", film_id, e);
            super::server_error()
        }
    }
}

// GET /api/films
async fn api_films(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Film>>, AppError> {
    let films = catalog::get_films_with_sessions(&state.db.pool).await?;
    Ok(Json(films))
}
