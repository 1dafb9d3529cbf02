use chrono::{Duration, Local, NaiveTime};
use sqlx::PgPool;
use tracing::info;

use crate::error::Result;

// (id, название, описание, длительность, жанр, постер)
const FILMS: &[(i64, &str, &str, i32, &str, &str)] = &[
    (1, "Дюна: Часть вторая", "Пол Атрейдес объединяется с Чани и фрименами на пути мести тем, кто уничтожил его семью.", 166, "Фантастика", "/static/img/dune2.jpg"),
    (2, "Оппенгеймер", "История физика-теоретика Роберта Оппенгеймера, создателя атомной бомбы.", 180, "Драма", "/static/img/oppenheimer.jpg"),
    (3, "Миссия невыполнима 7", "Итан Хант и его команда пытаются остановить искусственный интеллект, угрожающий человечеству.", 163, "Боевик", "/static/img/mission_impossible.jpg"),
    (4, "Трансформеры: Восхождение звероботов", "Оптимус Прайм и автоботы объединяются со звероботами против новой космической угрозы.", 127, "Фантастика", "/static/img/transformers.jpg"),
    (5, "Человек-паук: Паутина вселенных", "Майлз Моралес путешествует по мультивселенной, где встречает команду Людей-пауков.", 140, "Мультфильм", "/static/img/spiderman.jpg"),
    (6, "Джон Уик 4", "Джон Уик сражается с тайной организацией киллеров, чтобы обрести свободу.", 169, "Боевик", "/static/img/johnwick4.jpg"),
    (7, "Годзилла и Конг: Новая империя", "Годзилла и Конг объединяют силы против общего врага.", 115, "Фантастика", "/static/img/godzilla_kong.jpg"),
    (8, "Форсаж 10", "Доминик Торетто и его семья столкнутся с самым опасным врагом.", 141, "Боевик", "/static/img/fast10.jpg"),
    (9, "Стражи Галактики 3", "Команда Питера Квилла спасает Вселенную и раскрывает тайны Ракеты.", 150, "Фантастика", "/static/img/gotg3.jpg"),
    (10, "Индиана Джонс и колесо судьбы", "Индиана Джонс отправляется в очередное приключение за артефактом.", 154, "Приключения", "/static/img/indiana_jones.jpg"),
];

// (id, название, всего мест, тип)
const HALLS: &[(i64, &str, i32, &str)] = &[
    (1, "Зал 1 (2D)", 100, "2D"),
    (2, "Зал 2 (3D)", 80, "3D"),
    (3, "Зал 3 (IMAX)", 120, "IMAX"),
    (4, "Зал 4 (VIP)", 50, "VIP"),
];

// Раскладка: (id зала, всего мест, мест в ряду)
const HALL_LAYOUTS: &[(i64, i32, i32)] = &[(1, 100, 10), (2, 80, 8), (3, 120, 12), (4, 50, 5)];

// Расписание: (фильм, зал, смещение в днях, время, цена)
const SESSIONS: &[(i64, i64, i64, &str, f64)] = &[
    (1, 1, 0, "10:00:00", 120.0),
    (1, 2, 0, "13:30:00", 150.0),
    (2, 3, 0, "11:00:00", 180.0),
    (3, 1, 0, "14:00:00", 130.0),
    (4, 2, 0, "16:30:00", 140.0),
    (5, 4, 0, "19:00:00", 200.0),
    (6, 1, 0, "21:00:00", 160.0),
    (1, 3, 1, "12:00:00", 190.0),
    (2, 1, 1, "15:00:00", 120.0),
    (3, 2, 1, "17:30:00", 150.0),
    (7, 3, 1, "20:00:00", 180.0),
    (8, 4, 1, "22:00:00", 170.0),
    (4, 1, 2, "11:30:00", 120.0),
    (5, 2, 2, "14:00:00", 140.0),
    (9, 3, 2, "16:30:00", 180.0),
    (10, 1, 2, "19:00:00", 130.0),
    (1, 4, 2, "21:30:00", 220.0),
];

/// Заполнить справочники и демо-данные. Повторный запуск ничего не
/// дублирует: вставки идут с ON CONFLICT DO NOTHING, пользователи
/// добавляются только в пустую таблицу.
pub async fn run(pool: &PgPool) -> Result<()> {
    seed_films(pool).await?;
    seed_halls_and_seats(pool).await?;
    seed_sessions(pool).await?;
    seed_demo_bookings(pool).await?;
    seed_demo_users(pool).await?;
    info!("База данных заполнена справочными данными");
    Ok(())
}

async fn seed_films(pool: &PgPool) -> Result<()> {
    for &(id, title, description, duration, genre, poster) in FILMS {
        sqlx::query(
            r#"
            INSERT INTO films (id, title, description, duration, genre, poster_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(duration)
        .bind(genre)
        .bind(poster)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_halls_and_seats(pool: &PgPool) -> Result<()> {
    for &(id, name, seats_count, hall_type) in HALLS {
        sqlx::query(
            r#"
            INSERT INTO halls (id, name, seats_count, hall_type)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(seats_count)
        .bind(hall_type)
        .execute(pool)
        .await?;
    }

    // Нумерация мест 1,2,3... в каждом ряду, последний ряд может быть короче
    for &(hall_id, total_seats, seats_per_row) in HALL_LAYOUTS {
        let rows = (total_seats + seats_per_row - 1) / seats_per_row;
        for row in 1..=rows {
            let seats_in_row = seats_per_row.min(total_seats - (row - 1) * seats_per_row);
            for seat_num in 1..=seats_in_row {
                sqlx::query(
                    r#"
                    INSERT INTO seats (hall_id, row_number, seat_number)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (hall_id, row_number, seat_number) DO NOTHING
                    "#,
                )
                .bind(hall_id)
                .bind(row)
                .bind(seat_num)
                .execute(pool)
                .await?;
            }
        }
    }
    Ok(())
}

async fn seed_sessions(pool: &PgPool) -> Result<()> {
    let today = Local::now().date_naive();
    for &(film_id, hall_id, day_offset, time, price) in SESSIONS {
        let time: NaiveTime = time.parse().expect("seed session time");
        sqlx::query(
            r#"
            INSERT INTO sessions (film_id, hall_id, session_date, session_time, price)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (hall_id, session_date, session_time) DO NOTHING
            "#,
        )
        .bind(film_id)
        .bind(hall_id)
        .bind(today + Duration::days(day_offset))
        .bind(time)
        .bind(price)
        .execute(pool)
        .await?;
    }
    Ok(())
}

// Несколько демо-броней на первых сеансах; места берутся из зала сеанса
async fn seed_demo_bookings(pool: &PgPool) -> Result<()> {
    let booking_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
        .fetch_one(pool)
        .await?;
    if booking_count > 0 {
        return Ok(());
    }

    // (код, статус, email, имя, порядковый номер сеанса, места (ряд, номер))
    let demo: &[(&str, &str, &str, &str, i64, &[(i32, i32)])] = &[
        ("CINEMA001", "active", "anna.petrova@gmail.com", "Анна Петрова", 0, &[(1, 5), (1, 6)]),
        ("CINEMA002", "active", "oleg.shevchenko@ukr.net", "Олег Шевченко", 2, &[(3, 1)]),
        ("CINEMA003", "completed", "maria.ivanova@gmail.com", "Мария Иванова", 4, &[(2, 3)]),
    ];

    for &(code, status, email, name, session_offset, seats) in demo {
        let session: Option<(i64, i64)> =
            sqlx::query_as("SELECT id, hall_id FROM sessions ORDER BY id LIMIT 1 OFFSET $1")
                .bind(session_offset)
                .fetch_optional(pool)
                .await?;
        let Some((session_id, hall_id)) = session else {
            continue;
        };

        let booking_id: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO bookings (session_id, customer_email, customer_name, booking_code, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (booking_code) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(session_id)
        .bind(email)
        .bind(name)
        .bind(code)
        .bind(status)
        .fetch_optional(pool)
        .await?;
        let Some(booking_id) = booking_id else {
            continue;
        };

        for &(row, number) in seats {
            sqlx::query(
                r#"
                INSERT INTO booked_seats (booking_id, seat_id, session_id, status)
                SELECT $1, id, $2, $3 FROM seats
                WHERE hall_id = $4 AND row_number = $5 AND seat_number = $6
                ON CONFLICT (booking_id, seat_id) DO NOTHING
                "#,
            )
            .bind(booking_id)
            .bind(session_id)
            .bind(status)
            .bind(hall_id)
            .bind(row)
            .bind(number)
            .execute(pool)
            .await?;
        }
    }
    Ok(())
}

// Демо-учётки и уведомления; добавляются только в пустую таблицу users
async fn seed_demo_users(pool: &PgPool) -> Result<()> {
    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if user_count > 0 {
        return Ok(());
    }

    let demo_users: &[(&str, &str, &str, &str, &str, bool)] = &[
        ("admin@cinema.com", "admin", "admin123", "Администратор Системы", "+380001112233", true),
        ("user@test.com", "user", "user123", "Тестовый Пользователь", "+380991112233", false),
        ("anna.petrova@gmail.com", "anna", "anna123", "Анна Петрова", "+380501112233", false),
    ];

    let mut ids = Vec::with_capacity(demo_users.len());
    for &(email, username, password, full_name, phone, is_admin) in demo_users {
        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (email, username, password_hash, full_name, phone, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(username)
        .bind(hash)
        .bind(full_name)
        .bind(phone)
        .bind(is_admin)
        .fetch_one(pool)
        .await?;
        ids.push(id);
    }

    let notifications: &[(usize, &str, &str, &str, bool)] = &[
        (0, "system", "Добро пожаловать!", "Спасибо, что пользуетесь нашим кинотеатром.", false),
        (1, "promo", "Специальное предложение", "На этой неделе скидка 20% на все сеансы после 18:00.", false),
        (2, "booking", "Бронирование подтверждено", "Ваше бронирование CINEMA001 успешно создано.", true),
    ];

    for &(user_idx, kind, title, message, is_read) in notifications {
        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, type, title, message, is_read)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(ids[user_idx])
        .bind(kind)
        .bind(title)
        .bind(message)
        .bind(is_read)
        .execute(pool)
        .await?;
    }

    info!("Добавлены демо-пользователи");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_cover_declared_hall_capacity() {
        for &(hall_id, total_seats, seats_per_row) in HALL_LAYOUTS {
            let rows = (total_seats + seats_per_row - 1) / seats_per_row;
            let generated: i32 = (1..=rows)
                .map(|row| seats_per_row.min(total_seats - (row - 1) * seats_per_row))
                .sum();
            assert_eq!(generated, total_seats, "hall {}", hall_id);
        }
    }

    #[test]
    fn last_row_may_be_shorter() {
        // 50 мест по 5 в ряду: ровно 10 полных рядов
        let (_, total, per_row) = HALL_LAYOUTS[3];
        let rows = (total + per_row - 1) / per_row;
        assert_eq!(rows, 10);
        assert_eq!(per_row.min(total - (rows - 1) * per_row), 5);
    }

    #[test]
    fn every_session_references_seeded_film_and_hall() {
        for &(film_id, hall_id, _, time, price) in SESSIONS {
            assert!(FILMS.iter().any(|f| f.0 == film_id));
            assert!(HALLS.iter().any(|h| h.0 == hall_id));
            assert!(time.parse::<NaiveTime>().is_ok());
            assert!(price > 0.0);
        }
    }
}
