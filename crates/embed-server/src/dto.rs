use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    pub device: &'static str,
    pub cpu_threads: usize,
}

#[derive(Debug, Serialize)]
pub struct Endpoints {
    #[serde(rename = "/health")]
    pub health: &'static str,
    #[serde(rename = "/embed")]
    pub embed: &'static str,
    #[serde(rename = "/embed/query")]
    pub embed_query: &'static str,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            health: "Health check",
            embed: "Generate embeddings for any text",
            embed_query: "Generate embeddings for queries (with instruction)",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub name: String,
    pub model: String,
    /// Unknown until the model config has been read
    pub embedding_dim: Option<usize>,
    pub max_sequence_length: usize,
    pub device: &'static str,
    pub endpoints: Endpoints,
}
