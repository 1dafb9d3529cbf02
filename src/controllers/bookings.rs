use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{BookingDetails, SeatAvailability, SessionDetails};
use crate::services::{accounts, availability, booking};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/booking/{key}", get(booking_page))
}

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/book", post(book_tickets))
        .route("/cancel-booking/{code}", post(api_cancel_booking))
        .route("/sessions/{session_id}/seats", get(api_session_seats))
}

/* ---------- страницы ---------- */

// Ряд зала для шаблона схемы мест
struct SeatRow {
    row_number: i32,
    seats: Vec<SeatAvailability>,
}

#[derive(Template)]
#[template(path = "booking.html")]
struct BookingTemplate {
    session: SessionDetails,
    rows: Vec<SeatRow>,
}

#[derive(Template)]
#[template(path = "booking_details.html")]
struct BookingDetailsTemplate {
    booking: BookingDetails,
}

fn group_rows(seats: Vec<SeatAvailability>) -> Vec<SeatRow> {
    let mut rows: Vec<SeatRow> = Vec::new();
    for seat in seats {
        if let Some(row) = rows.last_mut() {
            if row.row_number == seat.row_number {
                row.seats.push(seat);
                continue;
            }
        }
        rows.push(SeatRow {
            row_number: seat.row_number,
            seats: vec![seat],
        });
    }
    rows
}

// /booking/{id} - выбор мест, /booking/{code} - просмотр брони.
// Числовой сегмент означает сеанс, как int-конвертер в старом роутинге.
async fn booking_page(State(state): State<Arc<AppState>>, Path(key): Path<String>) -> Response {
    match key.parse::<i64>() {
        Ok(session_id) => seat_selection_page(&state, session_id).await,
        Err(_) => booking_details_page(&state, &key).await,
    }
}

async fn seat_selection_page(state: &AppState, session_id: i64) -> Response {
    let session = match crate::services::catalog::get_session_by_id(&state.db.pool, session_id).await
    {
        Ok(Some(session)) => session,
        Ok(None) => return super::not_found(),
        Err(e) => {
            tracing::error!("Ошибка получения сеанса {}: {:?}", session_id, e);
            return super::server_error();
        }
    };

    match availability::for_session(&state.db.pool, session_id).await {
        Ok(seats) => super::render(BookingTemplate {
            session,
            rows: group_rows(seats),
        }),
        Err(e) => {
            tracing::error!("Ошибка получения мест сеанса {}: {:?}", session_id, e);
            super::server_error()
        }
    }
}

async fn booking_details_page(state: &AppState, code: &str) -> Response {
    match booking::get_booking_by_code(&state.db.pool, code).await {
        Ok(Some(booking)) => super::render(BookingDetailsTemplate { booking }),
        Ok(None) => super::not_found(),
        Err(e) => {
            tracing::error!("Ошибка получения бронирования {}: {:?}", code, e);
            super::server_error()
        }
    }
}

/* ---------- API ---------- */

const REQUIRED_FIELDS: [&str; 4] = [
    "session_id",
    "customer_email",
    "customer_name",
    "selected_seats",
];

// Разбор тела /api/book: каждое отсутствующее поле называем по имени
fn parse_book_request(payload: Value) -> Result<booking::BookingRequest> {
    let object = payload
        .as_object()
        .ok_or_else(|| AppError::Validation("Некорректный формат данных".into()))?;

    for field in REQUIRED_FIELDS {
        if !object.contains_key(field) {
            return Err(AppError::Validation(format!(
                "Отсутствует обязательное поле: {}",
                field
            )));
        }
    }

    let session_id = object["session_id"]
        .as_i64()
        .ok_or_else(|| AppError::Validation("Некорректный формат данных".into()))?;
    let customer_email = object["customer_email"]
        .as_str()
        .ok_or_else(|| AppError::Validation("Некорректный формат данных".into()))?
        .to_string();
    let customer_name = object["customer_name"]
        .as_str()
        .ok_or_else(|| AppError::Validation("Некорректный формат данных".into()))?
        .to_string();
    let selected_seats = object["selected_seats"]
        .as_array()
        .ok_or_else(|| AppError::Validation("Некорректный формат данных".into()))?
        .clone();

    Ok(booking::BookingRequest {
        session_id,
        customer_email,
        customer_name,
        selected_seats,
    })
}

// POST /api/book
async fn book_tickets(
    State(state): State<Arc<AppState>>,
    user: Option<AuthUser>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    let request = parse_book_request(payload)?;
    let booking_code =
        booking::create_booking(&state.db.pool, &state.config.booking, request).await?;

    // Вошедшему пользователю кладём уведомление; его сбой бронь не ломает
    if let Some(user) = user {
        let message = format!("Ваше бронирование {} успешно создано.", booking_code);
        if let Err(e) = accounts::add_notification(
            &state.db.pool,
            user.id,
            "booking",
            "Бронирование подтверждено",
            &message,
        )
        .await
        {
            tracing::warn!("Не удалось создать уведомление о брони: {:?}", e);
        }
    }

    Ok(Json(json!({
        "success": true,
        "booking_code": booking_code,
        "message": "Бронирование успешно!"
    })))
}

// POST /api/cancel-booking/{code}
async fn api_cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Response> {
    if booking::cancel_booking(&state.db.pool, &code).await? {
        Ok(Json(json!({
            "success": true,
            "message": "Бронирование успешно отменено"
        }))
        .into_response())
    } else {
        Ok((
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "message": "Бронирование не найдено или уже отменено"
            })),
        )
            .into_response())
    }
}

// GET /api/sessions/{session_id}/seats
async fn api_session_seats(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<i64>,
) -> Result<Json<Vec<SeatAvailability>>> {
    let seats = availability::for_session(&state.db.pool, session_id).await?;
    Ok(Json(seats))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_payload() -> Value {
        json!({
            "session_id": 1,
            "customer_email": "a@b.com",
            "customer_name": "Ann Lee",
            "selected_seats": [1, 2]
        })
    }

    #[test]
    fn parses_complete_payload() {
        let req = parse_book_request(full_payload()).unwrap();
        assert_eq!(req.session_id, 1);
        assert_eq!(req.customer_email, "a@b.com");
        assert_eq!(req.selected_seats.len(), 2);
    }

    #[test]
    fn missing_field_is_named_in_error() {
        for field in REQUIRED_FIELDS {
            let mut payload = full_payload();
            payload.as_object_mut().unwrap().remove(field);
            match parse_book_request(payload) {
                Err(AppError::Validation(msg)) => assert!(msg.contains(field), "{}", msg),
                other => panic!("unexpected: {:?}", other),
            }
        }
    }

    #[test]
    fn non_object_body_is_rejected() {
        assert!(matches!(
            parse_book_request(json!([1, 2, 3])),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn groups_seats_into_rows_in_order() {
        let seats: Vec<SeatAvailability> = vec![
            (1, 1, 1),
            (2, 1, 2),
            (3, 2, 1),
            (4, 2, 2),
            (5, 3, 1),
        ]
        .into_iter()
        .map(|(id, row, number)| SeatAvailability {
            id,
            hall_id: 1,
            row_number: row,
            seat_number: number,
            is_available: true,
        })
        .collect();

        let rows = group_rows(seats);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].seats.len(), 2);
        assert_eq!(rows[2].row_number, 3);
        assert_eq!(rows[2].seats[0].id, 5);
    }
}
