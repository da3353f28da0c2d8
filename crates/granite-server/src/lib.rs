mod dto;
mod error;
mod handlers;
pub mod job;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use granite_core::http::with_layers;

pub use job::{LiveSuite, SuiteRunner};
pub use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    with_layers(
        Router::new()
            .route("/benchmark", post(handlers::benchmark::trigger))
            .route("/results", get(handlers::benchmark::results)),
        Router::new()
            .route("/health", get(handlers::health))
            .route("/status", get(handlers::benchmark::status)),
    )
    .with_state(state)
}
