use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_QUERY_INSTRUCTION;

fn default_instruction() -> Option<String> {
    Some(DEFAULT_QUERY_INSTRUCTION.to_string())
}

fn default_normalize() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub texts: Vec<String>,
    /// Task description; only applied by the query endpoint
    #[serde(default = "default_instruction")]
    pub instruction: Option<String>,
    #[serde(default = "default_normalize")]
    pub normalize: bool,
    /// Token limit per text; the server's configured default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl EmbedRequest {
    pub fn new(texts: Vec<String>) -> Self {
        Self {
            texts,
            instruction: default_instruction(),
            normalize: default_normalize(),
            max_length: None,
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub embeddings: Vec<Vec<f32>>,
    pub model: String,
    pub embedding_dim: usize,
    pub num_embeddings: usize,
}

impl EmbedResponse {
    pub fn new(model: impl Into<String>, embeddings: Vec<Vec<f32>>) -> Self {
        let embedding_dim = embeddings.first().map(Vec::len).unwrap_or(0);
        Self {
            model: model.into(),
            embedding_dim,
            num_embeddings: embeddings.len(),
            embeddings,
        }
    }
}

/// `Instruct: {task}\nQuery: {query}` prompt used for instruction-aware retrieval models
pub fn format_query(instruction: &str, query: &str) -> String {
    format!("Instruct: {instruction}\nQuery: {query}")
}
