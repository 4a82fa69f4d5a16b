use axum::{http::StatusCode, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::auth::handlers;
use crate::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/id_token", get(handlers::id_token))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}
