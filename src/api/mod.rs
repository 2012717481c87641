// API module - HTTP endpoints

use axum::{routing::get, Router};

use self::middleware::session::AppState;

pub mod auth;
pub mod export;
pub mod health;
pub mod middleware;
pub mod rifa;

/// All API routes. Session and tracing layers are added by the caller.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(auth::router())
        .merge(rifa::router())
        .merge(export::router())
}
