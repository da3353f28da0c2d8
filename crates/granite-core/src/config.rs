use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{GraniteError, Result};

pub const DEFAULT_QUERY_INSTRUCTION: &str =
    "Given a web search query, retrieve relevant passages that answer the query";

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    let Some(raw) = env_string(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| GraniteError::Config(format!("{key} has an invalid value: {raw}")))
}

/// Settings for the chat-completion benchmark client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    pub host: String,
    pub port: u16,
    pub model: String,
    pub request_timeout_secs: u64,
    pub health_timeout_secs: u64,
    pub sample_interval_ms: u64,
    /// Substring matched against process names when counting inference threads
    pub process_name: String,
    pub expected_threads: u32,
    #[serde(default)]
    pub export: Option<PathBuf>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8081,
            model: "granite-4.0-h-tiny".to_string(),
            request_timeout_secs: 120,
            health_timeout_secs: 5,
            sample_interval_ms: 100,
            process_name: "llama-server".to_string(),
            expected_threads: 48,
            export: Some(PathBuf::from("benchmark_results.json")),
        }
    }
}

impl BenchConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(host) = env_string("GRANITE_HOST") {
            config.host = host;
        }
        if let Some(port) = env_parse("GRANITE_PORT")? {
            config.port = port;
        }
        if let Some(model) = env_string("GRANITE_MODEL") {
            config.model = model;
        }
        Ok(config)
    }

    pub fn with_target(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerServerConfig {
    pub bind: String,
    pub port: u16,
    pub default_target_host: String,
    pub default_target_port: u16,
}

impl Default for TriggerServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8082,
            default_target_host: "localhost".to_string(),
            default_target_port: 8080,
        }
    }
}

impl TriggerServerConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(port) = env_parse("BENCHMARK_API_PORT")? {
            config.port = port;
        }
        Ok(config)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedServerConfig {
    pub bind: String,
    pub port: u16,
    pub model_id: String,
    /// Local directory with config.json, tokenizer.json and safetensors; skips the hub
    #[serde(default)]
    pub model_dir: Option<PathBuf>,
    pub revision: String,
    pub default_max_length: usize,
    pub max_sequence_length: usize,
}

impl Default for EmbedServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 9000,
            model_id: "Qwen/Qwen3-Embedding-8B".to_string(),
            model_dir: None,
            revision: "main".to_string(),
            default_max_length: 8192,
            max_sequence_length: 32768,
        }
    }
}

impl EmbedServerConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(model_id) = env_string("EMBED_MODEL_ID") {
            config.model_id = model_id;
        }
        if let Some(dir) = env_string("EMBED_MODEL_DIR") {
            config.model_dir = Some(PathBuf::from(dir));
        }
        if let Some(revision) = env_string("EMBED_MODEL_REVISION") {
            config.revision = revision;
        }
        if let Some(port) = env_parse("EMBED_PORT")? {
            config.port = port;
        }
        Ok(config)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSmokeConfig {
    pub granite_base_url: String,
    pub granite_model: String,
    #[serde(default, skip_serializing)]
    pub openai_api_key: Option<String>,
    pub openai_model: String,
}

impl Default for AgentSmokeConfig {
    fn default() -> Self {
        Self {
            granite_base_url: "http://localhost:8081/v1".to_string(),
            granite_model: "granite-4.0-h-tiny".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
        }
    }
}

impl AgentSmokeConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(url) = env_string("GRANITE_BASE_URL") {
            config.granite_base_url = url;
        }
        if let Some(model) = env_string("GRANITE_MODEL") {
            config.granite_model = model;
        }
        config.openai_api_key = env_string("OPENAI_API_KEY");
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bench_defaults_target_local_llama_server() {
        let config = BenchConfig::default();
        assert_eq!(config.base_url(), "http://localhost:8081");
        assert_eq!(config.request_timeout_secs, 120);
        assert_eq!(config.health_timeout_secs, 5);
    }

    #[test]
    fn with_target_overrides_host_and_port() {
        let config = BenchConfig::default().with_target("10.0.0.5", 8080);
        assert_eq!(config.base_url(), "http://10.0.0.5:8080");
    }

    #[test]
    fn server_addresses() {
        assert_eq!(TriggerServerConfig::default().addr(), "0.0.0.0:8082");
        assert_eq!(EmbedServerConfig::default().addr(), "0.0.0.0:9000");
    }

    #[test]
    fn api_key_is_never_serialized() {
        let config = AgentSmokeConfig {
            openai_api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
