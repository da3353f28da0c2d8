mod dto;
pub mod error;
mod handlers;
pub mod loader;
pub mod model;
pub mod pooling;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use granite_core::http::with_layers;
use granite_core::EmbedServerConfig;
use tracing::info;

pub use error::{EmbedError, Result};
pub use loader::ModelFiles;
pub use model::{Embedder, Qwen3Embedder};
pub use state::AppState;

pub const DEVICE: &str = "cpu";

/// Resolves and loads the configured checkpoint. Blocking and slow for large models.
pub fn load_model(config: &EmbedServerConfig) -> Result<Qwen3Embedder> {
    let files = ModelFiles::resolve(config)?;
    let embedder = Qwen3Embedder::load(&files, &config.model_id)?;
    info!(
        "Model loaded on {} with {} threads",
        DEVICE,
        candle_core::utils::get_num_threads()
    );
    Ok(embedder)
}

pub fn router(state: Arc<AppState>) -> Router {
    with_layers(
        Router::new()
            .route("/embed", post(handlers::embed::embed))
            .route("/embed/query", post(handlers::embed::embed_query)),
        Router::new()
            .route("/", get(handlers::info))
            .route("/health", get(handlers::health)),
    )
    .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use granite_core::{format_query, DEFAULT_QUERY_INSTRUCTION};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::model::tests::StubEmbedder;

    fn loaded(dimension: usize) -> (Arc<AppState>, Router) {
        let state = Arc::new(AppState::new(EmbedServerConfig::default()));
        state.install(StubEmbedder::new(dimension));
        (state.clone(), router(state))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn norm(row: &Value) -> f64 {
        row.as_array()
            .unwrap()
            .iter()
            .map(|x| x.as_f64().unwrap().powi(2))
            .sum::<f64>()
            .sqrt()
    }

    #[tokio::test]
    async fn health_reports_loading_until_model_installed() {
        let state = Arc::new(AppState::new(EmbedServerConfig::default()));
        let app = router(state.clone());

        let (status, body) = call(&app, "GET", "/health", Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "loading");
        assert_eq!(body["model"], "Qwen/Qwen3-Embedding-8B");
        assert_eq!(body["device"], "cpu");
        assert!(body["cpu_threads"].as_u64().unwrap() >= 1);

        state.install(StubEmbedder::new(4));
        let (_, body) = call(&app, "GET", "/health", Value::Null).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["model"], "stub/embedder");
    }

    #[tokio::test]
    async fn embed_before_load_is_503() {
        let app = router(Arc::new(AppState::new(EmbedServerConfig::default())));
        let (status, body) = call(&app, "POST", "/embed", json!({"texts": ["hello"]})).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["detail"], "Model not loaded");
    }

    #[tokio::test]
    async fn embed_returns_one_unit_vector_per_text() {
        let (_, app) = loaded(16);
        let texts = json!(["The capital of China is Beijing.", "Gravity is a force.", "x"]);
        let (status, body) = call(&app, "POST", "/embed", json!({"texts": texts})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["num_embeddings"], 3);
        assert_eq!(body["embedding_dim"], 16);
        assert_eq!(body["model"], "stub/embedder");
        for row in body["embeddings"].as_array().unwrap() {
            assert_eq!(row.as_array().unwrap().len(), 16);
            assert!((norm(row) - 1.0).abs() < 1e-5);
        }
    }

    #[tokio::test]
    async fn embed_can_skip_normalization() {
        let (_, app) = loaded(4);
        let (status, body) = call(
            &app,
            "POST",
            "/embed",
            json!({"texts": ["abcd"], "normalize": false}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["embeddings"][0], json!([4.0, 1.0, 0.0, 0.0]));
    }

    #[tokio::test]
    async fn empty_texts_are_rejected() {
        let (_, app) = loaded(4);
        for uri in ["/embed", "/embed/query"] {
            let (status, body) = call(&app, "POST", uri, json!({"texts": []})).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["detail"], "No texts provided");
        }
    }

    #[tokio::test]
    async fn malformed_body_has_detail() {
        let (_, app) = loaded(4);
        let (status, body) = call(&app, "POST", "/embed", json!({"documents": ["a"]})).await;
        assert!(status.is_client_error());
        assert!(body["detail"].as_str().unwrap().contains("texts"));
    }

    #[tokio::test]
    async fn query_endpoint_applies_instruction() {
        let stub = StubEmbedder::new(4);
        let seen = stub.seen.clone();
        let state = Arc::new(AppState::new(EmbedServerConfig::default()));
        state.install(stub);
        let app = router(state);

        let (status, _) = call(
            &app,
            "POST",
            "/embed/query",
            json!({"texts": ["what is gravity"], "instruction": "Find physics passages"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&app, "POST", "/embed/query", json!({"texts": ["capital of China"]})).await;
        assert_eq!(status, StatusCode::OK);

        // Documents are embedded verbatim even when an instruction is sent.
        call(
            &app,
            "POST",
            "/embed",
            json!({"texts": ["Beijing"], "instruction": "ignored"}),
        )
        .await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                format_query("Find physics passages", "what is gravity"),
                format_query(DEFAULT_QUERY_INSTRUCTION, "capital of China"),
                "Beijing".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn inference_failure_is_500() {
        let state = Arc::new(AppState::new(EmbedServerConfig::default()));
        let mut stub = StubEmbedder::new(4);
        stub.fail = true;
        state.install(stub);
        let app = router(state);

        let (status, body) = call(&app, "POST", "/embed", json!({"texts": ["a"]})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Tokenizer error: stub failure");
    }

    #[tokio::test]
    async fn info_lists_endpoints() {
        let (_, app) = loaded(4096);
        let (status, body) = call(&app, "GET", "/", Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "embedder API");
        assert_eq!(body["embedding_dim"], 4096);
        assert_eq!(body["max_sequence_length"], 32768);
        assert!(body["endpoints"]["/embed/query"].is_string());
    }

    #[tokio::test]
    async fn zero_max_length_is_rejected() {
        let (_, app) = loaded(4);
        let (status, body) = call(&app, "POST", "/embed", json!({"texts": ["a"], "max_length": 0})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "max_length must be positive");
    }

    #[tokio::test]
    async fn max_length_is_clamped_and_defaults_from_config() {
        let stub = StubEmbedder::new(4);
        let max_lengths = stub.max_lengths.clone();
        let config = EmbedServerConfig {
            default_max_length: 512,
            ..Default::default()
        };
        let state = Arc::new(AppState::new(config));
        state.install(stub);
        let app = router(state);

        for body in [
            json!({"texts": ["a"], "max_length": 100_000}),
            json!({"texts": ["a"], "max_length": 64}),
            json!({"texts": ["a"]}),
        ] {
            let (status, _) = call(&app, "POST", "/embed", body).await;
            assert_eq!(status, StatusCode::OK);
        }

        assert_eq!(*max_lengths.lock().unwrap(), vec![32768, 64, 512]);
    }
}
