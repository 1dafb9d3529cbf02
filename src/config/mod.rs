use serde::Deserialize;
use std::env;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub booking: BookingConfig,
    pub tmdb: TmdbConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub rust_log: String,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Сессионные куки и пароли
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub secret_key: String,
    pub session_ttl_hours: i64,
}

// Правила бронирования
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    pub code_prefix: String,
    pub max_seats_per_booking: usize,
    pub code_attempts: u32,
}

// Интеграция с TMDB (каталог не синхронизируется, ключ зарезервирован)
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbConfig {
    pub api_key: String,
    pub base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()
                    .expect("PORT must be a valid number"),
                debug: env::var("DEBUG")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .expect("DEBUG must be true or false"),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "cinema_booking=debug,tower_http=debug".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgres://localhost/cinema".to_string()),
                pool_size: env::var("DB_POOL_SIZE")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .expect("DB_POOL_SIZE must be a valid number"),
            },
            auth: AuthConfig {
                secret_key: env::var("SECRET_KEY")
                    .unwrap_or_else(|_| "cinema-secret-key-2024".to_string()),
                session_ttl_hours: env::var("SESSION_TTL_HOURS")
                    .unwrap_or_else(|_| "24".to_string())
                    .parse()
                    .expect("SESSION_TTL_HOURS must be a valid number"),
            },
            booking: BookingConfig {
                code_prefix: env::var("BOOKING_CODE_PREFIX")
                    .unwrap_or_else(|_| "CINEMA".to_string()),
                max_seats_per_booking: env::var("MAX_SEATS_PER_BOOKING")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .expect("MAX_SEATS_PER_BOOKING must be a valid number"),
                code_attempts: env::var("BOOKING_CODE_ATTEMPTS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .expect("BOOKING_CODE_ATTEMPTS must be a valid number"),
            },
            tmdb: TmdbConfig {
                api_key: env::var("TMDB_API_KEY").unwrap_or_default(),
                base_url: env::var("TMDB_BASE_URL")
                    .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string()),
            },
        }
    }
}
