use sqlx::PgPool;

use crate::error::Result;
use crate::models::{Film, FilmSession, SessionDetails};

/// Афиша: фильмы с ближайшими сеансами, отсортированные по первому показу
pub async fn get_films_with_sessions(pool: &PgPool) -> Result<Vec<Film>> {
    let films = sqlx::query_as::<_, Film>(
        r#"
        SELECT f.id, f.title, f.description, f.duration, f.genre, f.poster_url, f.created_at
        FROM films f
        JOIN sessions s ON f.id = s.film_id
        WHERE s.session_date >= CURRENT_DATE
        GROUP BY f.id
        ORDER BY MIN(s.session_date)
        LIMIT 8
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(films)
}

pub async fn get_film_by_id(pool: &PgPool, film_id: i64) -> Result<Option<Film>> {
    let film = sqlx::query_as::<_, Film>("SELECT * FROM films WHERE id = $1")
        .bind(film_id)
        .fetch_optional(pool)
        .await?;
    Ok(film)
}

/// Уникальные предстоящие сеансы фильма для расписания
pub async fn get_unique_sessions_for_film(pool: &PgPool, film_id: i64) -> Result<Vec<FilmSession>> {
    let sessions = sqlx::query_as::<_, FilmSession>(
        r#"
        SELECT DISTINCT s.id, s.session_date, s.session_time, s.price,
               h.name AS hall_name, h.hall_type
        FROM sessions s
        JOIN halls h ON s.hall_id = h.id
        WHERE s.film_id = $1 AND s.session_date >= CURRENT_DATE
        ORDER BY s.session_date, s.session_time
        "#,
    )
    .bind(film_id)
    .fetch_all(pool)
    .await?;
    Ok(sessions)
}

/// Сеанс с данными фильма и зала для страницы выбора мест
pub async fn get_session_by_id(pool: &PgPool, session_id: i64) -> Result<Option<SessionDetails>> {
    let session = sqlx::query_as::<_, SessionDetails>(
        r#"
        SELECT s.id, s.film_id, s.hall_id, s.session_date, s.session_time, s.price,
               f.title AS film_title, f.duration, f.genre AS film_genre,
               h.name AS hall_name, h.hall_type
        FROM sessions s
        JOIN films f ON s.film_id = f.id
        JOIN halls h ON s.hall_id = h.id
        WHERE s.id = $1
        "#,
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;
    Ok(session)
}
