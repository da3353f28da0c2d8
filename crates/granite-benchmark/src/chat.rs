use std::time::Duration;

use granite_core::{BenchConfig, GraniteError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Client for an OpenAI-compatible chat-completion server (llama.cpp `llama-server`)
#[derive(Debug, Clone)]
pub struct ChatClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
    request_timeout: Duration,
    health_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

/// llama.cpp extension carried next to `usage`
#[derive(Debug, Default, Deserialize)]
pub struct Timings {
    #[serde(default)]
    pub predicted_per_second: Option<f64>,
    #[serde(default)]
    pub prompt_ms: Option<f64>,
}

impl Timings {
    /// True when the server sent a `timings` object without any usable field
    pub fn is_empty(&self) -> bool {
        self.predicted_per_second.is_none() && self.prompt_ms.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Usage,
    #[serde(default)]
    timings: Option<Timings>,
}

#[derive(Debug, Default)]
pub struct ChatCompletion {
    pub content: String,
    pub usage: Usage,
    pub timings: Option<Timings>,
}

impl ChatClient {
    pub fn new(config: &BenchConfig) -> Self {
        Self {
            base_url: config.base_url(),
            model: config.model.clone(),
            client: reqwest::Client::new(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            health_timeout: Duration::from_secs(config.health_timeout_secs),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// True only when `GET /health` answers 200
    pub async fn health(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).timeout(self.health_timeout).send().await {
            Ok(resp) => resp.status() == reqwest::StatusCode::OK,
            Err(e) => {
                warn!("Health check failed: {}", e);
                false
            }
        }
    }

    pub async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<ChatCompletion> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature,
        };

        let resp = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(&request)
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

        let body = resp
            .text()
            .await
            .map_err(|e| GraniteError::Http(e.to_string()))?;

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            GraniteError::Http(format!(
                "Failed to parse response: {} - Body: {}",
                e,
                body.chars().take(500).collect::<String>()
            ))
        })?;

        debug!(
            prompt_tokens = parsed.usage.prompt_tokens,
            completion_tokens = parsed.usage.completion_tokens,
            "Chat completion received"
        );

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(ChatCompletion {
            content,
            usage: parsed.usage,
            timings: parsed.timings.filter(|t| !t.is_empty()),
        })
    }
}
