use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use mimalloc::MiMalloc;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinema_booking::{config::Config, controllers, AppState};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Cinema Booking service");

    // Подключение к БД, миграции и справочные данные
    let state = AppState::new(config.clone())
        .await
        .expect("Failed to initialize application state");

    // Create the main router
    let app = Router::new()
        .merge(controllers::routes())
        .nest("/api", controllers::api_routes())
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new("static"))
        .fallback(controllers::fallback_404)
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.app.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app.into_make_service())
        .await
        .unwrap();
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.db.ping().await {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "DB unavailable")
    }
}
