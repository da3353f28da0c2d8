use std::sync::{Mutex, OnceLock, PoisonError};

use granite_core::EmbedServerConfig;

use crate::error::Result;
use crate::model::{encode, Embedder};

pub struct LoadedModel {
    pub model_id: String,
    pub dimension: usize,
    embedder: Mutex<Box<dyn Embedder>>,
}

impl LoadedModel {
    /// Blocking; call from `spawn_blocking`.
    pub fn encode(&self, texts: &[String], max_length: usize, normalize: bool) -> Result<Vec<Vec<f32>>> {
        let mut embedder = self.embedder.lock().unwrap_or_else(PoisonError::into_inner);
        encode(embedder.as_mut(), texts, max_length, normalize)
    }
}

pub struct AppState {
    pub config: EmbedServerConfig,
    model: OnceLock<LoadedModel>,
}

impl AppState {
    pub fn new(config: EmbedServerConfig) -> Self {
        Self {
            config,
            model: OnceLock::new(),
        }
    }

    /// Makes the model available to handlers. Returns false if one was already installed.
    pub fn install(&self, embedder: impl Embedder + 'static) -> bool {
        let loaded = LoadedModel {
            model_id: embedder.model_id().to_string(),
            dimension: embedder.dimension(),
            embedder: Mutex::new(Box::new(embedder)),
        };
        self.model.set(loaded).is_ok()
    }

    pub fn model(&self) -> Option<&LoadedModel> {
        self.model.get()
    }
}
