//! Model description and startup compatibility check.
//!
//! `config.json` from the checkpoint is parsed into a [`ModelSpec`] and
//! checked against the tokenizer and the requested sequence length before
//! any weights are loaded.

use candle_transformers::models::bert::{Config, HiddenAct, PositionEmbeddingType};
use serde::Deserialize;

use crate::{EmbedError, Result};

/// The subset of a Hugging Face BERT `config.json` the embedder needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelSpec {
    pub model_type: Option<String>,
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    pub hidden_act: String,
    pub hidden_dropout_prob: f64,
    pub max_position_embeddings: usize,
    pub type_vocab_size: usize,
    pub initializer_range: f64,
    pub layer_norm_eps: f64,
    pub pad_token_id: usize,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            model_type: None,
            vocab_size: 30522,
            hidden_size: 768,
            num_hidden_layers: 12,
            num_attention_heads: 12,
            intermediate_size: 3072,
            hidden_act: "gelu".to_string(),
            hidden_dropout_prob: 0.1,
            max_position_embeddings: 512,
            type_vocab_size: 2,
            initializer_range: 0.02,
            layer_norm_eps: 1e-12,
            pad_token_id: 0,
        }
    }
}

impl ModelSpec {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Verify that this checkpoint can be driven by `BertModel` with a
    /// tokenizer of `tokenizer_vocab` entries at `max_length` tokens.
    pub fn check(&self, tokenizer_vocab: usize, max_length: usize) -> Result<()> {
        if let Some(model_type) = self.model_type.as_deref() {
            if model_type != "bert" {
                return Err(EmbedError::Incompatible(format!(
                    "model_type '{model_type}' is not a BERT checkpoint"
                )));
            }
        }
        if tokenizer_vocab > self.vocab_size {
            return Err(EmbedError::Incompatible(format!(
                "tokenizer has {tokenizer_vocab} tokens but the model embeds only {}",
                self.vocab_size
            )));
        }
        if max_length < 2 || max_length > self.max_position_embeddings {
            return Err(EmbedError::Incompatible(format!(
                "max_length {max_length} outside 2..={}",
                self.max_position_embeddings
            )));
        }
        Ok(())
    }

    /// Candle's BERT config for this checkpoint.
    pub fn to_bert_config(&self) -> Config {
        let hidden_act = match self.hidden_act.as_str() {
            "relu" => HiddenAct::Relu,
            "gelu_new" | "gelu_approximate" => HiddenAct::GeluApproximate,
            _ => HiddenAct::Gelu,
        };

        Config {
            vocab_size: self.vocab_size,
            hidden_size: self.hidden_size,
            num_hidden_layers: self.num_hidden_layers,
            num_attention_heads: self.num_attention_heads,
            intermediate_size: self.intermediate_size,
            hidden_act,
            hidden_dropout_prob: self.hidden_dropout_prob,
            max_position_embeddings: self.max_position_embeddings,
            type_vocab_size: self.type_vocab_size,
            initializer_range: self.initializer_range,
            layer_norm_eps: self.layer_norm_eps,
            pad_token_id: self.pad_token_id,
            position_embedding_type: PositionEmbeddingType::Absolute,
            use_cache: true,
            classifier_dropout: None,
            // Older checkpoints omit model_type but prefix weights with "bert."
            model_type: Some(self.model_type.clone().unwrap_or_else(|| "bert".to_string())),
        }
    }
}
