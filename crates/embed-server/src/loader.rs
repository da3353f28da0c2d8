//! Resolves checkpoint files from a local directory or the HuggingFace Hub

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use granite_core::EmbedServerConfig;
use hf_hub::{api::sync::Api, Repo, RepoType};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{EmbedError, Result};

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHTS_FILE: &str = "model.safetensors";
const WEIGHTS_INDEX_FILE: &str = "model.safetensors.index.json";

#[derive(Debug, Clone, PartialEq)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: Vec<PathBuf>,
}

#[derive(Deserialize)]
struct WeightIndex {
    weight_map: std::collections::HashMap<String, String>,
}

/// Shard file names referenced by a safetensors index, deduplicated and sorted
pub fn shard_names(index: &Path) -> Result<Vec<String>> {
    let index: WeightIndex = serde_json::from_slice(&std::fs::read(index)?)?;
    let shards: BTreeSet<String> = index.weight_map.into_values().collect();
    Ok(shards.into_iter().collect())
}

/// True when the repository file listing carries a safetensors index
fn is_sharded(listing: &[String]) -> bool {
    listing.iter().any(|name| name == WEIGHTS_INDEX_FILE)
}

fn existing(path: PathBuf) -> Result<PathBuf> {
    if path.exists() {
        Ok(path)
    } else {
        Err(EmbedError::MissingFile(path))
    }
}

impl ModelFiles {
    pub fn resolve(config: &EmbedServerConfig) -> Result<Self> {
        match &config.model_dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::from_hub(&config.model_id, &config.revision),
        }
    }

    pub fn from_dir(dir: &Path) -> Result<Self> {
        debug!("Resolving model files in {}", dir.display());

        let index = dir.join(WEIGHTS_INDEX_FILE);
        let weights = if index.exists() {
            shard_names(&index)?
                .into_iter()
                .map(|name| existing(dir.join(name)))
                .collect::<Result<Vec<_>>>()?
        } else {
            vec![existing(dir.join(WEIGHTS_FILE))?]
        };

        Ok(Self {
            config: existing(dir.join(CONFIG_FILE))?,
            tokenizer: existing(dir.join(TOKENIZER_FILE))?,
            weights,
        })
    }

    /// Downloads (or reuses the cached copy of) every file the model needs
    pub fn from_hub(model_id: &str, revision: &str) -> Result<Self> {
        info!("Fetching {} ({}) from HuggingFace Hub...", model_id, revision);

        let api = Api::new()?;
        let repo = api.repo(Repo::with_revision(
            model_id.to_string(),
            RepoType::Model,
            revision.to_string(),
        ));

        let config = repo.get(CONFIG_FILE)?;
        let tokenizer = repo.get(TOKENIZER_FILE)?;

        let listing: Vec<String> = repo
            .info()?
            .siblings
            .into_iter()
            .map(|s| s.rfilename)
            .collect();

        let weights = if is_sharded(&listing) {
            let index = repo.get(WEIGHTS_INDEX_FILE)?;
            let mut paths = Vec::new();
            for name in shard_names(&index)? {
                debug!("Fetching shard: {}", name);
                paths.push(repo.get(&name)?);
            }
            paths
        } else {
            vec![repo.get(WEIGHTS_FILE)?]
        };

        info!("Model files ready ({} weight files)", weights.len());
        Ok(Self {
            config,
            tokenizer,
            weights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"{}").unwrap();
    }

    #[test]
    fn single_file_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        for name in [CONFIG_FILE, TOKENIZER_FILE, WEIGHTS_FILE] {
            touch(dir.path(), name);
        }

        let files = ModelFiles::from_dir(dir.path()).unwrap();
        assert_eq!(files.weights, vec![dir.path().join(WEIGHTS_FILE)]);
        assert_eq!(files.tokenizer, dir.path().join(TOKENIZER_FILE));
    }

    #[test]
    fn sharded_checkpoint_follows_index() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), CONFIG_FILE);
        touch(dir.path(), TOKENIZER_FILE);
        touch(dir.path(), "model-00001-of-00002.safetensors");
        touch(dir.path(), "model-00002-of-00002.safetensors");
        fs::write(
            dir.path().join(WEIGHTS_INDEX_FILE),
            r#"{"metadata": {"total_size": 16}, "weight_map": {
                "norm.weight": "model-00002-of-00002.safetensors",
                "embed_tokens.weight": "model-00001-of-00002.safetensors",
                "layers.0.mlp.up_proj.weight": "model-00001-of-00002.safetensors"
            }}"#,
        )
        .unwrap();

        let files = ModelFiles::from_dir(dir.path()).unwrap();
        assert_eq!(
            files.weights,
            vec![
                dir.path().join("model-00001-of-00002.safetensors"),
                dir.path().join("model-00002-of-00002.safetensors"),
            ]
        );
    }

    #[test]
    fn missing_tokenizer_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), CONFIG_FILE);
        touch(dir.path(), WEIGHTS_FILE);

        let err = ModelFiles::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, EmbedError::MissingFile(p) if p.ends_with(TOKENIZER_FILE)));
    }

    #[test]
    fn local_dir_takes_precedence_over_hub() {
        let dir = tempfile::tempdir().unwrap();
        for name in [CONFIG_FILE, TOKENIZER_FILE, WEIGHTS_FILE] {
            touch(dir.path(), name);
        }
        let config = EmbedServerConfig {
            model_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        let files = ModelFiles::resolve(&config).unwrap();
        assert_eq!(files.config, dir.path().join(CONFIG_FILE));
    }

    #[test]
    fn listing_decides_between_index_and_single_file() {
        let sharded = vec![
            CONFIG_FILE.to_string(),
            WEIGHTS_INDEX_FILE.to_string(),
            "model-00001-of-00004.safetensors".to_string(),
        ];
        assert!(is_sharded(&sharded));

        let single = vec![CONFIG_FILE.to_string(), WEIGHTS_FILE.to_string()];
        assert!(!is_sharded(&single));
    }
}
