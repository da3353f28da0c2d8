use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraniteError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API returned status {status}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Monitor error: {0}")]
    Monitor(String),
}

pub type Result<T> = std::result::Result<T, GraniteError>;
