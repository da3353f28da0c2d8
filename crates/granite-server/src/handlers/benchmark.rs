use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use granite_core::{timestamp, RunOutcome};
use tracing::info;

use crate::dto::{StatusResponse, TriggerRequest, TriggerResponse};
use crate::error::AppError;
use crate::job::run_job;
use crate::state::AppState;

fn parse_trigger(body: &[u8]) -> Result<TriggerRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(TriggerRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))
}

pub async fn trigger(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<TriggerResponse>, AppError> {
    let req = parse_trigger(&body)?;

    if !state.try_begin() {
        return Err(AppError::Busy);
    }

    let host = req
        .host
        .unwrap_or_else(|| state.server.default_target_host.clone());
    let port = req.port.unwrap_or(state.server.default_target_port);
    let target = state.bench.clone().with_target(host, port);

    info!(target = %target.base_url(), "Benchmark triggered");
    tokio::spawn(run_job(state.clone(), target));

    Ok(Json(TriggerResponse {
        status: "started",
        message: "Benchmark started in background",
        timestamp: timestamp(),
    }))
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (running, has_results) = state.status();
    Json(StatusResponse {
        running,
        has_results,
        timestamp: timestamp(),
    })
}

pub async fn results(State(state): State<Arc<AppState>>) -> Result<Json<RunOutcome>, AppError> {
    state.latest().map(Json).ok_or(AppError::NoResults)
}
