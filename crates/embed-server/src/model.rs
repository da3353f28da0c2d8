use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::qwen3::{Config, Model};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::error::{EmbedError, Result};
use crate::loader::ModelFiles;
use crate::pooling::{l2_normalize, last_token_pool};

/// A text encoder producing one pooled vector per input.
pub trait Embedder: Send {
    fn model_id(&self) -> &str;

    fn dimension(&self) -> usize;

    /// Returns pooled hidden states shaped `[texts.len(), dimension]`.
    fn embed(&mut self, texts: &[String], max_length: usize) -> Result<Tensor>;
}

/// Runs `embedder` and converts the pooled tensor into response rows.
pub fn encode(
    embedder: &mut dyn Embedder,
    texts: &[String],
    max_length: usize,
    normalize: bool,
) -> Result<Vec<Vec<f32>>> {
    let pooled = embedder.embed(texts, max_length)?;
    let pooled = if normalize {
        l2_normalize(&pooled)?
    } else {
        pooled
    };
    Ok(pooled.to_dtype(DType::F32)?.to_vec2::<f32>()?)
}

pub struct Qwen3Embedder {
    model: Model,
    tokenizer: Tokenizer,
    device: Device,
    model_id: String,
    hidden_size: usize,
}

impl Qwen3Embedder {
    pub fn load(files: &ModelFiles, model_id: impl Into<String>) -> Result<Self> {
        let model_id = model_id.into();
        let device = Device::Cpu;

        let mut tokenizer = Tokenizer::from_file(&files.tokenizer).map_err(EmbedError::tokenizer)?;
        // Rows are padded by hand so the mask stays exact.
        tokenizer.with_padding(None);

        let config: Config = serde_json::from_slice(&std::fs::read(&files.config)?)?;
        let hidden_size = config.hidden_size;

        info!(
            "Loading {} ({} layers, hidden size {}) from {} weight files",
            model_id,
            config.num_hidden_layers,
            hidden_size,
            files.weights.len()
        );

        let vb = unsafe { VarBuilder::from_mmaped_safetensors(files.weights.as_slice(), DType::F32, &device)? };
        // Embedding checkpoints ship the bare transformer without the `model.` prefix.
        let vb = if vb.contains_tensor("model.embed_tokens.weight") {
            vb
        } else {
            vb.rename_f(|name: &str| name.strip_prefix("model.").unwrap_or(name).to_string())
        };
        let model = Model::new(&config, vb)?;

        Ok(Self {
            model,
            tokenizer,
            device,
            model_id,
            hidden_size,
        })
    }

    fn tokenize(&mut self, texts: &[String], max_length: usize) -> Result<(Tensor, Tensor)> {
        self.tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(EmbedError::tokenizer)?;

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(EmbedError::tokenizer)?;

        let seq_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
        if seq_len == 0 {
            return Err(EmbedError::Tokenizer("texts produced no tokens".to_string()));
        }

        let mut ids = Vec::with_capacity(texts.len() * seq_len);
        let mut mask = Vec::with_capacity(texts.len() * seq_len);
        for encoding in &encodings {
            let len = encoding.get_ids().len();
            ids.extend_from_slice(encoding.get_ids());
            ids.resize(ids.len() + seq_len - len, 0);
            mask.extend_from_slice(encoding.get_attention_mask());
            mask.resize(mask.len() + seq_len - len, 0);
        }

        let shape = (texts.len(), seq_len);
        Ok((
            Tensor::from_vec(ids, shape, &self.device)?,
            Tensor::from_vec(mask, shape, &self.device)?,
        ))
    }
}

impl Embedder for Qwen3Embedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.hidden_size
    }

    fn embed(&mut self, texts: &[String], max_length: usize) -> Result<Tensor> {
        let (input_ids, mask) = self.tokenize(texts, max_length)?;
        debug!(shape = ?input_ids.dims(), "Running forward pass");

        // Right padding under causal attention leaves real positions untouched.
        self.model.clear_kv_cache();
        let hidden = self.model.forward(&input_ids, 0);
        self.model.clear_kv_cache();

        Ok(last_token_pool(&hidden?, &mask)?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Deterministic encoder: each text maps to `[byte_len, 1, 0, ...]`.
    pub struct StubEmbedder {
        pub dimension: usize,
        pub fail: bool,
        pub seen: Arc<Mutex<Vec<String>>>,
        pub max_lengths: Arc<Mutex<Vec<usize>>>,
    }

    impl StubEmbedder {
        pub fn new(dimension: usize) -> Self {
            Self {
                dimension,
                fail: false,
                seen: Arc::default(),
                max_lengths: Arc::default(),
            }
        }
    }

    impl Embedder for StubEmbedder {
        fn model_id(&self) -> &str {
            "stub/embedder"
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn embed(&mut self, texts: &[String], max_length: usize) -> Result<Tensor> {
            if self.fail {
                return Err(EmbedError::Tokenizer("stub failure".to_string()));
            }
            self.seen.lock().unwrap().extend(texts.iter().cloned());
            self.max_lengths.lock().unwrap().push(max_length);
            let data: Vec<f32> = texts
                .iter()
                .flat_map(|t| {
                    let len = t.len() as f32;
                    (0..self.dimension).map(move |i| match i {
                        0 => len,
                        1 => 1.0,
                        _ => 0.0,
                    })
                })
                .collect();
            Ok(Tensor::from_vec(data, (texts.len(), self.dimension), &Device::Cpu)?)
        }
    }

    #[test]
    fn encode_normalizes_on_request() {
        let mut stub = StubEmbedder::new(4);
        let texts = vec!["abc".to_string(), "hello world".to_string()];

        let rows = encode(&mut stub, &texts, 8192, true).unwrap();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.len(), 4);
            let norm = row.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }

        let raw = encode(&mut stub, &texts, 8192, false).unwrap();
        assert_eq!(raw[0], vec![3.0, 1.0, 0.0, 0.0]);
    }
}
