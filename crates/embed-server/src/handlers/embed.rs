use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use granite_core::{format_query, EmbedRequest, EmbedResponse, DEFAULT_QUERY_INSTRUCTION};
use tracing::{error, info};

use crate::error::AppError;
use crate::state::AppState;

pub async fn embed(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EmbedRequest>, JsonRejection>,
) -> Result<Json<EmbedResponse>, AppError> {
    let Json(req) = payload?;
    run(state, req.texts, req.max_length, req.normalize).await
}

/// Same as `embed` after wrapping every text in the retrieval instruction.
pub async fn embed_query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EmbedRequest>, JsonRejection>,
) -> Result<Json<EmbedResponse>, AppError> {
    let Json(req) = payload?;
    if req.texts.is_empty() {
        return Err(AppError::NoTexts);
    }

    let instruction = req.instruction.as_deref().unwrap_or(DEFAULT_QUERY_INSTRUCTION);
    let texts = req
        .texts
        .iter()
        .map(|query| format_query(instruction, query))
        .collect();
    run(state, texts, req.max_length, req.normalize).await
}

async fn run(
    state: Arc<AppState>,
    texts: Vec<String>,
    max_length: Option<usize>,
    normalize: bool,
) -> Result<Json<EmbedResponse>, AppError> {
    let model_id = state.model().ok_or(AppError::NotLoaded)?.model_id.clone();
    if texts.is_empty() {
        return Err(AppError::NoTexts);
    }
    let max_length = max_length.unwrap_or(state.config.default_max_length);
    if max_length == 0 {
        return Err(AppError::BadRequest("max_length must be positive".to_string()));
    }
    let max_length = max_length.min(state.config.max_sequence_length);

    let count = texts.len();
    let start = Instant::now();
    let worker = state.clone();
    let embeddings = tokio::task::spawn_blocking(move || {
        let model = worker.model().ok_or(AppError::NotLoaded)?;
        model
            .encode(&texts, max_length, normalize)
            .map_err(AppError::from)
    })
    .await
    .map_err(|e| AppError::Inference(e.to_string()))?
    .inspect_err(|e| error!("Embedding generation failed: {:?}", e))?;

    info!(
        texts = count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Embeddings generated"
    );
    Ok(Json(EmbedResponse::new(model_id, embeddings)))
}
