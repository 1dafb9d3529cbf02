use std::collections::HashSet;

use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::booking::STATUS_ACTIVE;
use crate::models::{Seat, SeatAvailability};

/// Все места зала сеанса с признаком занятости.
///
/// Занятым считается место, на которое ссылается активная бронь этого
/// сеанса. Неизвестный сеанс даёт пустой список - вызывающая сторона
/// превращает его в 404 там, где это уместно.
///
/// Работает на обычном соединении и внутри транзакции бронирования,
/// чтобы проверка занятости выполнялась на том же снимке данных.
pub async fn get_available_seats(
    conn: &mut PgConnection,
    session_id: i64,
) -> Result<Vec<SeatAvailability>> {
    // Все места зала этого сеанса
    let seats: Vec<Seat> = sqlx::query_as(
        r#"
        SELECT st.id, st.hall_id, st.row_number, st.seat_number
        FROM seats st
        JOIN sessions s ON st.hall_id = s.hall_id
        WHERE s.id = $1
        ORDER BY st.row_number, st.seat_number
        "#,
    )
    .bind(session_id)
    .fetch_all(&mut *conn)
    .await?;

    // Места, занятые активными бронями сеанса
    let taken: Vec<i64> = sqlx::query_scalar(
        r#"
        SELECT bs.seat_id
        FROM booked_seats bs
        JOIN bookings b ON bs.booking_id = b.id
        WHERE b.session_id = $1 AND b.status = $2
        "#,
    )
    .bind(session_id)
    .bind(STATUS_ACTIVE)
    .fetch_all(&mut *conn)
    .await?;

    let taken: HashSet<i64> = taken.into_iter().collect();
    Ok(mark_availability(seats, &taken))
}

/// Вариант для обработчиков, у которых нет своей транзакции
pub async fn for_session(pool: &PgPool, session_id: i64) -> Result<Vec<SeatAvailability>> {
    let mut conn = pool.acquire().await?;
    get_available_seats(&mut conn, session_id).await
}

fn mark_availability(seats: Vec<Seat>, taken: &HashSet<i64>) -> Vec<SeatAvailability> {
    seats
        .into_iter()
        .map(|s| SeatAvailability {
            is_available: !taken.contains(&s.id),
            id: s.id,
            hall_id: s.hall_id,
            row_number: s.row_number,
            seat_number: s.seat_number,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(id: i64, row: i32, number: i32) -> Seat {
        Seat {
            id,
            hall_id: 1,
            row_number: row,
            seat_number: number,
        }
    }

    #[test]
    fn marks_taken_seats_unavailable() {
        let seats = vec![seat(1, 1, 1), seat(2, 1, 2), seat(3, 1, 3)];
        let taken: HashSet<i64> = [1, 3].into_iter().collect();

        let marked = mark_availability(seats, &taken);

        assert_eq!(marked.len(), 3);
        assert!(!marked[0].is_available);
        assert!(marked[1].is_available);
        assert!(!marked[2].is_available);
    }

    #[test]
    fn partitions_exactly_into_available_and_taken() {
        let seats: Vec<Seat> = (1..=10).map(|i| seat(i, 1, i as i32)).collect();
        let taken: HashSet<i64> = [2, 5, 9].into_iter().collect();

        let marked = mark_availability(seats, &taken);
        let unavailable: HashSet<i64> = marked
            .iter()
            .filter(|s| !s.is_available)
            .map(|s| s.id)
            .collect();

        assert_eq!(unavailable, taken);
        assert_eq!(marked.iter().filter(|s| s.is_available).count(), 7);
    }

    #[test]
    fn empty_hall_gives_empty_result() {
        let marked = mark_availability(vec![], &HashSet::new());
        assert!(marked.is_empty());
    }
}
