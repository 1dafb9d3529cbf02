use std::collections::HashSet;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};

use crate::config::BookingConfig;
use crate::error::{AppError, Result};
use crate::models::booking::{STATUS_ACTIVE, STATUS_CANCELLED};
use crate::models::BookingDetails;
use crate::services::availability;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex")
});

/// Заявка на бронирование, уже прошедшая десериализацию.
/// selected_seats остаются сырыми JSON-значениями: фронтенд шлёт
/// вперемешку числа и строки, приведение - часть валидации.
#[derive(Debug)]
pub struct BookingRequest {
    pub session_id: i64,
    pub customer_email: String,
    pub customer_name: String,
    pub selected_seats: Vec<Value>,
}

fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn validate_name(name: &str) -> bool {
    name.trim().chars().count() >= 2
}

// Числа и числовые строки приводим к id, всё прочее - ошибка формата
fn parse_seat_ids(raw: &[Value]) -> Option<Vec<i64>> {
    raw.iter()
        .map(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
        .collect()
}

/// Предусловия бронирования в строгом порядке, каждое со своей причиной
/// отказа. Возвращает приведённые id мест.
pub fn validate_request(req: &BookingRequest, max_seats: usize) -> Result<Vec<i64>> {
    if !validate_email(&req.customer_email) {
        return Err(AppError::Validation("Некорректный формат email".into()));
    }
    if !validate_name(&req.customer_name) {
        return Err(AppError::Validation(
            "Имя должно содержать минимум 2 символа".into(),
        ));
    }
    if req.selected_seats.is_empty() {
        return Err(AppError::Validation("Выберите хотя бы одно место".into()));
    }
    if req.selected_seats.len() > max_seats {
        return Err(AppError::Validation(format!(
            "Максимум {} мест за бронирование",
            max_seats
        )));
    }
    parse_seat_ids(&req.selected_seats)
        .ok_or_else(|| AppError::Validation("Некорректный формат ID мест".into()))
}

fn generate_code(prefix: &str) -> String {
    format!("{}{:06}", prefix, rand::thread_rng().gen_range(0..1_000_000))
}

// Ограниченный перебор кодов с проверкой глобальной уникальности.
// Исчерпание попыток - серверная ошибка, не повод для вечного цикла.
async fn allocate_booking_code(
    tx: &mut Transaction<'_, Postgres>,
    config: &BookingConfig,
) -> Result<String> {
    for _ in 0..config.code_attempts {
        let candidate = generate_code(&config.code_prefix);
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bookings WHERE booking_code = $1)")
                .bind(&candidate)
                .fetch_one(&mut **tx)
                .await?;
        if !exists {
            return Ok(candidate);
        }
    }
    Err(AppError::CodeGeneration)
}

// Нарушение частичного уникального индекса по активным местам сеанса
fn is_active_seat_conflict(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.constraint())
        .map(|c| c == "uq_booked_seats_active")
        .unwrap_or(false)
}

/// Создать бронирование: валидация, затем одна транзакция
/// проверка занятости -> код -> запись брони и мест.
///
/// Advisory-блокировка по сеансу сериализует конкурентов, частичный
/// уникальный индекс booked_seats перехватывает двойную запись, если
/// бронь пришла мимо этого кода. Любая ошибка откатывает всё целиком.
pub async fn create_booking(
    pool: &PgPool,
    config: &BookingConfig,
    req: BookingRequest,
) -> Result<String> {
    let seat_ids = validate_request(&req, config.max_seats_per_booking)?;

    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(req.session_id)
        .execute(&mut *tx)
        .await?;

    // Перепроверяем занятость уже под блокировкой
    let seats = availability::get_available_seats(&mut tx, req.session_id).await?;
    let available: HashSet<i64> = seats
        .iter()
        .filter(|s| s.is_available)
        .map(|s| s.id)
        .collect();

    for seat_id in &seat_ids {
        if !available.contains(seat_id) {
            return Err(AppError::SeatTaken(format!("Место {} уже занято", seat_id)));
        }
    }

    let booking_code = allocate_booking_code(&mut tx, config).await?;

    let booking_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO bookings (session_id, customer_email, customer_name, booking_code, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(req.session_id)
    .bind(&req.customer_email)
    .bind(&req.customer_name)
    .bind(&booking_code)
    .bind(STATUS_ACTIVE)
    .fetch_one(&mut *tx)
    .await?;

    for seat_id in &seat_ids {
        let inserted = sqlx::query(
            r#"
            INSERT INTO booked_seats (booking_id, seat_id, session_id, status)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(booking_id)
        .bind(seat_id)
        .bind(req.session_id)
        .bind(STATUS_ACTIVE)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            // Конкурент успел раньше: транзакция откатится при Drop
            if is_active_seat_conflict(&e) {
                warn!(
                    "seat {} for session {} grabbed concurrently",
                    seat_id, req.session_id
                );
                return Err(AppError::SeatTaken(format!("Место {} уже занято", seat_id)));
            }
            return Err(e.into());
        }
    }

    tx.commit().await?;
    info!(
        "Создано бронирование {} для {}",
        booking_code, req.customer_email
    );
    Ok(booking_code)
}

const DETAILS_SELECT: &str = r#"
    SELECT b.id, b.session_id, b.customer_email, b.customer_name, b.booking_code,
           b.status, b.created_at,
           s.session_date, s.session_time, s.film_id,
           f.title AS film_title, h.name AS hall_name,
           array_agg(st.row_number::text || '-' || st.seat_number::text
                     ORDER BY st.row_number, st.seat_number) AS seats
    FROM bookings b
    JOIN sessions s ON b.session_id = s.id
    JOIN films f ON s.film_id = f.id
    JOIN halls h ON s.hall_id = h.id
    JOIN booked_seats bs ON b.id = bs.booking_id
    JOIN seats st ON bs.seat_id = st.id
"#;

/// Бронь по коду со всеми данными для страницы просмотра
pub async fn get_booking_by_code(pool: &PgPool, code: &str) -> Result<Option<BookingDetails>> {
    let sql = format!(
        "{} WHERE b.booking_code = $1 GROUP BY b.id, s.id, f.id, h.id",
        DETAILS_SELECT
    );
    let booking = sqlx::query_as::<_, BookingDetails>(&sql)
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(booking)
}

/// История броней по email, новые первыми
pub async fn get_bookings_by_email(pool: &PgPool, email: &str) -> Result<Vec<BookingDetails>> {
    let sql = format!(
        "{} WHERE b.customer_email = $1 GROUP BY b.id, s.id, f.id, h.id ORDER BY b.created_at DESC",
        DETAILS_SELECT
    );
    let bookings = sqlx::query_as::<_, BookingDetails>(&sql)
        .bind(email)
        .fetch_all(pool)
        .await?;
    Ok(bookings)
}

/// Брони пользователя: сопоставляются по email его учётной записи
pub async fn get_user_bookings(pool: &PgPool, user_id: i64) -> Result<Vec<BookingDetails>> {
    let sql = format!(
        "{} WHERE b.customer_email = (SELECT email FROM users WHERE id = $1)
         GROUP BY b.id, s.id, f.id, h.id ORDER BY b.created_at DESC",
        DETAILS_SELECT
    );
    let bookings = sqlx::query_as::<_, BookingDetails>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(bookings)
}

/// Отмена по коду: active -> cancelled вместе с зеркальным статусом мест.
///
/// Повторная отмена и неизвестный код дают Ok(false) без изменений.
/// Строки booked_seats не удаляются - история мест нужна страницам
/// просмотра, из занятости их выводит фильтр по активному статусу.
pub async fn cancel_booking(pool: &PgPool, code: &str) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let cancelled: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE bookings SET status = $2
        WHERE booking_code = $1 AND status = $3
        RETURNING id
        "#,
    )
    .bind(code)
    .bind(STATUS_CANCELLED)
    .bind(STATUS_ACTIVE)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(booking_id) = cancelled else {
        return Ok(false);
    };

    sqlx::query("UPDATE booked_seats SET status = $2 WHERE booking_id = $1")
        .bind(booking_id)
        .bind(STATUS_CANCELLED)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!("Отменено бронирование {}", code);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(email: &str, name: &str, seats: Vec<Value>) -> BookingRequest {
        BookingRequest {
            session_id: 1,
            customer_email: email.to_string(),
            customer_name: name.to_string(),
            selected_seats: seats,
        }
    }

    #[test]
    fn accepts_valid_request() {
        let req = request("a@b.com", "Ann Lee", vec![json!(1), json!(2)]);
        let ids = validate_request(&req, 10).unwrap();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn rejects_malformed_email() {
        for email in ["plainaddress", "a@b", "a@b.c", "имя@домен.рф", "a b@c.com"] {
            let req = request(email, "Ann Lee", vec![json!(1)]);
            match validate_request(&req, 10) {
                Err(AppError::Validation(msg)) => assert!(msg.contains("email"), "{}", msg),
                other => panic!("{} accepted: {:?}", email, other),
            }
        }
    }

    #[test]
    fn accepts_plus_and_dots_in_local_part() {
        let req = request("first.last+tag@mail.example.org", "Ann Lee", vec![json!(1)]);
        assert!(validate_request(&req, 10).is_ok());
    }

    #[test]
    fn rejects_short_name_after_trim() {
        let req = request("a@b.com", "  A  ", vec![json!(1)]);
        assert!(matches!(
            validate_request(&req, 10),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn rejects_empty_seat_list_before_anything_else_touches_it() {
        let req = request("a@b.com", "Ann Lee", vec![]);
        match validate_request(&req, 10) {
            Err(AppError::Validation(msg)) => assert!(msg.contains("место")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn rejects_more_seats_than_cap() {
        let seats: Vec<Value> = (1..=11).map(|i| json!(i)).collect();
        let req = request("a@b.com", "Ann Lee", seats);
        match validate_request(&req, 10) {
            Err(AppError::Validation(msg)) => assert!(msg.contains("10")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn email_is_checked_before_seat_list() {
        // Порядок предусловий фиксирован: первой должна сработать почта
        let req = request("not-an-email", "Ann Lee", vec![]);
        match validate_request(&req, 10) {
            Err(AppError::Validation(msg)) => assert!(msg.contains("email")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn coerces_numeric_strings_to_seat_ids() {
        let req = request("a@b.com", "Ann Lee", vec![json!("5"), json!(7), json!(" 9 ")]);
        let ids = validate_request(&req, 10).unwrap();
        assert_eq!(ids, vec![5, 7, 9]);
    }

    #[test]
    fn rejects_unparsable_seat_id() {
        let req = request("a@b.com", "Ann Lee", vec![json!(1), json!("abc")]);
        match validate_request(&req, 10) {
            Err(AppError::Validation(msg)) => assert!(msg.contains("ID")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn code_matches_prefix_and_six_digits() {
        for _ in 0..200 {
            let code = generate_code("CINEMA");
            assert_eq!(code.len(), "CINEMA".len() + 6);
            assert!(code.starts_with("CINEMA"));
            assert!(code["CINEMA".len()..].chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn code_respects_configured_prefix() {
        let code = generate_code("KINO");
        assert!(code.starts_with("KINO"));
        assert_eq!(code.len(), 4 + 6);
    }
}
