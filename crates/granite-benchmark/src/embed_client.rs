use std::time::{Duration, Instant};

use granite_core::{EmbedRequest, EmbedResponse, GraniteError, Result};
use serde_json::Value;
use tracing::debug;

/// Client for the embedding server's `/health`, `/embed` and `/embed/query` endpoints
#[derive(Debug, Clone)]
pub struct EmbedClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug)]
pub struct TimedEmbedding {
    pub response: EmbedResponse,
    pub elapsed: Duration,
}

impl EmbedClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Health payload; errors on transport failure or any non-200 status
    pub async fn health(&self) -> Result<Value> {
        let url = format!("{}/health", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GraniteError::Http(e.to_string()))?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(GraniteError::Api {
                status: status.as_u16(),
                body,
            });
        }

        resp.json().await.map_err(|e| GraniteError::Http(e.to_string()))
    }

    pub async fn embed(&self, request: &EmbedRequest) -> Result<TimedEmbedding> {
        self.post("/embed", request).await
    }

    pub async fn embed_query(&self, request: &EmbedRequest) -> Result<TimedEmbedding> {
        self.post("/embed/query", request).await
    }

    async fn post(&self, path: &str, request: &EmbedRequest) -> Result<TimedEmbedding> {
        let url = format!("{}{}", self.base_url, path);
        let start = Instant::now();

        let resp = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| GraniteError::Http(e.to_string()))?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(GraniteError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response: EmbedResponse = resp
            .json()
            .await
            .map_err(|e| GraniteError::Http(e.to_string()))?;
        let elapsed = start.elapsed();

        if response.embeddings.len() != request.texts.len() {
            return Err(GraniteError::Embedding(format!(
                "expected {} embeddings, got {}",
                request.texts.len(),
                response.embeddings.len()
            )));
        }

        debug!(
            path,
            num_embeddings = response.num_embeddings,
            elapsed_ms = elapsed.as_millis() as u64,
            "Embedding request complete"
        );
        Ok(TimedEmbedding { response, elapsed })
    }
}
