//! Configuration for the embedding service.

use serde::{Deserialize, Serialize};

/// Configuration for the BERT embedder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Hugging Face model ID
    pub model_id: String,

    /// Pinned model revision (branch, tag or commit). `None` tracks `main`.
    pub revision: Option<String>,

    /// Maximum sequence length including special tokens (default: 512)
    pub max_length: usize,

    /// Pooling strategy (default: sum)
    pub pooling: super::PoolingStrategy,

    /// L2-normalize embeddings (default: false)
    pub normalize: bool,

    /// Use GPU if available (default: false)
    pub use_gpu: bool,

    /// Cache directory for downloaded models
    pub cache_dir: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: "allenai/scibert_scivocab_uncased".to_string(),
            revision: None,
            max_length: 512,
            pooling: super::PoolingStrategy::Sum,
            normalize: false,
            use_gpu: false,
            cache_dir: None,
        }
    }
}

impl EmbeddingConfig {
    /// Create config for CPU-only inference.
    pub fn cpu() -> Self {
        Self {
            use_gpu: false,
            ..Default::default()
        }
    }

    /// Create config for GPU inference.
    pub fn gpu() -> Self {
        Self {
            use_gpu: true,
            ..Default::default()
        }
    }

    /// Use a custom model.
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Pin a model revision.
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    /// Set maximum sequence length.
    pub fn with_max_length(mut self, length: usize) -> Self {
        self.max_length = length;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PoolingStrategy;

    #[test]
    fn test_defaults_match_scibert_sum_pooling() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.model_id, "allenai/scibert_scivocab_uncased");
        assert!(matches!(config.pooling, PoolingStrategy::Sum));
        assert!(!config.normalize);
        assert_eq!(config.max_length, 512);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: EmbeddingConfig =
            serde_json::from_str(r#"{"pooling": "mean", "revision": "abc123"}"#).unwrap();
        assert!(matches!(config.pooling, PoolingStrategy::Mean));
        assert_eq!(config.revision.as_deref(), Some("abc123"));
        assert_eq!(config.model_id, EmbeddingConfig::default().model_id);
    }

    #[test]
    fn test_builders() {
        let config = EmbeddingConfig::gpu()
            .with_model("bert-base-uncased")
            .with_revision("v1")
            .with_max_length(128);
        assert!(config.use_gpu);
        assert_eq!(config.model_id, "bert-base-uncased");
        assert_eq!(config.max_length, 128);
    }
}
