pub mod embed;

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::dto::{Endpoints, HealthResponse, InfoResponse};
use crate::state::AppState;
use crate::DEVICE;

fn model_id(state: &AppState) -> String {
    state
        .model()
        .map(|m| m.model_id.clone())
        .unwrap_or_else(|| state.config.model_id.clone())
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = if state.model().is_some() {
        "healthy"
    } else {
        "loading"
    };
    Json(HealthResponse {
        status,
        model: model_id(&state),
        device: DEVICE,
        cpu_threads: candle_core::utils::get_num_threads(),
    })
}

pub async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    let model = model_id(&state);
    let short_name = model.rsplit('/').next().unwrap_or(&model);
    Json(InfoResponse {
        name: format!("{short_name} API"),
        embedding_dim: state.model().map(|m| m.dimension),
        max_sequence_length: state.config.max_sequence_length,
        device: DEVICE,
        endpoints: Endpoints::default(),
        model,
    })
}
