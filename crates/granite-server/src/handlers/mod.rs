pub mod benchmark;

use axum::Json;
use granite_core::timestamp;

use crate::dto::HealthResponse;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "benchmark-api",
        timestamp: timestamp(),
    })
}
