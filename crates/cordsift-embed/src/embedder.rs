//! SciBERT embedder using Candle.

use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::BertModel;
use hf_hub::api::sync::{ApiBuilder, ApiRepo};
use hf_hub::{Repo, RepoType};
use serde_json::json;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::compat::ModelSpec;
use crate::pooling::l2_normalize;
use crate::{EmbedError, EmbeddingConfig, Result};

/// Turns a piece of text into a fixed-length vector.
///
/// Implementations must be deterministic: the same text always yields the
/// same vector.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Length of every vector returned by [`Embedder::embed`].
    fn dimension(&self) -> usize;

    fn model_id(&self) -> &str;
}

/// BERT-family embedder backed by a Hugging Face checkpoint.
///
/// Inference runs one sentence at a time on the configured device.
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    config: EmbeddingConfig,
    hidden_size: usize,
}

impl BertEmbedder {
    /// Download (or reuse from cache) and load the configured checkpoint.
    ///
    /// Fails with [`EmbedError::Incompatible`] before any weights are read
    /// when the checkpoint cannot be driven by this embedder.
    pub async fn load(config: EmbeddingConfig) -> Result<Self> {
        let start = Instant::now();
        info!(model_id = %config.model_id, revision = ?config.revision, "Loading embedding model");

        let device = Self::select_device(&config)?;
        debug!("Using device: {:?}", device);

        let fetch_config = config.clone();
        let (spec, tokenizer, weights_path) =
            tokio::task::spawn_blocking(move || Self::fetch(&fetch_config))
                .await
                .map_err(|e| EmbedError::Download(e.to_string()))??;

        spec.check(tokenizer.get_vocab_size(true), config.max_length)?;

        let vb = if weights_path.extension().is_some_and(|e| e == "safetensors") {
            unsafe { VarBuilder::from_mmaped_safetensors(&[&weights_path], DType::F32, &device)? }
        } else {
            VarBuilder::from_pth(&weights_path, DType::F32, &device)?
        };

        let model = BertModel::load(vb, &spec.to_bert_config())
            .map_err(|e| EmbedError::ModelLoad(e.to_string()))?;
        info!("Model loaded in {:.2}s", start.elapsed().as_secs_f32());

        Ok(Self {
            model,
            tokenizer,
            device,
            hidden_size: spec.hidden_size,
            config,
        })
    }

    /// Fetch config, tokenizer and weights from the hub. Blocking.
    fn fetch(config: &EmbeddingConfig) -> Result<(ModelSpec, Tokenizer, PathBuf)> {
        let mut builder = ApiBuilder::new().with_progress(false);
        if let Some(dir) = &config.cache_dir {
            builder = builder.with_cache_dir(PathBuf::from(dir));
        }
        let api = builder.build()?;
        let revision = config.revision.clone().unwrap_or_else(|| "main".to_string());
        let repo = api.repo(Repo::with_revision(config.model_id.clone(), RepoType::Model, revision));

        let config_path = repo.get("config.json")?;
        let spec = ModelSpec::from_json(&std::fs::read_to_string(&config_path)?)?;

        let tokenizer = match repo.get("tokenizer.json") {
            Ok(path) => {
                debug!("Using tokenizer.json");
                Tokenizer::from_file(&path)?
            }
            Err(_) => {
                info!("tokenizer.json not found, building from vocab.txt");
                let vocab_path = repo.get("vocab.txt")?;
                let lowercase = do_lower_case(&repo, &config.model_id);
                wordpiece_tokenizer(&vocab_path, lowercase)?
            }
        };

        let weights_path = repo
            .get("model.safetensors")
            .or_else(|_| repo.get("pytorch_model.bin"))
            .map_err(|e| EmbedError::Download(format!("model weights: {e}")))?;
        debug!("Weights at: {:?}", weights_path);

        Ok((spec, tokenizer, weights_path))
    }

    /// Select the best available device.
    fn select_device(config: &EmbeddingConfig) -> Result<Device> {
        if !config.use_gpu {
            return Ok(Device::Cpu);
        }

        #[cfg(feature = "cuda")]
        {
            match Device::new_cuda(0) {
                Ok(device) => {
                    info!("CUDA device available");
                    return Ok(device);
                }
                Err(e) => debug!("CUDA not available: {}, falling back to CPU", e),
            }
        }

        #[cfg(feature = "metal")]
        {
            match Device::new_metal(0) {
                Ok(device) => {
                    info!("Metal device available");
                    return Ok(device);
                }
                Err(e) => debug!("Metal not available: {}, falling back to CPU", e),
            }
        }

        Ok(Device::Cpu)
    }
}

impl Embedder for BertEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self.tokenizer.encode(text, true)?;
        // Drop padding a bundled tokenizer.json may have configured.
        let mut ids: Vec<u32> = encoding
            .get_ids()
            .iter()
            .zip(encoding.get_attention_mask())
            .filter(|&(_, &mask)| mask != 0)
            .map(|(&id, _)| id)
            .collect();
        if ids.is_empty() {
            return Err(EmbedError::InvalidInput(format!(
                "text encodes to zero tokens: {text:?}"
            )));
        }
        truncate_ids(&mut ids, self.config.max_length);

        let seq_len = ids.len();
        let input_ids = Tensor::new(ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = Tensor::ones((1, seq_len), DType::F32, &self.device)?;

        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = self.config.pooling.apply(&hidden, &attention_mask)?;
        let pooled = if self.config.normalize {
            l2_normalize(&pooled)?
        } else {
            pooled
        };

        Ok(pooled.squeeze(0)?.to_vec1::<f32>()?)
    }

    fn dimension(&self) -> usize {
        self.hidden_size
    }

    fn model_id(&self) -> &str {
        &self.config.model_id
    }
}

/// Keep the first `max_length - 1` ids and the final one ([SEP]).
pub(crate) fn truncate_ids(ids: &mut Vec<u32>, max_length: usize) {
    if max_length < 2 || ids.len() <= max_length {
        return;
    }
    let last = ids[ids.len() - 1];
    ids.truncate(max_length - 1);
    ids.push(last);
}

/// Lowercasing for a vocab-only checkpoint: `tokenizer_config.json` when
/// present, otherwise inferred from the model id.
fn do_lower_case(repo: &ApiRepo, model_id: &str) -> bool {
    let from_config = repo
        .get("tokenizer_config.json")
        .ok()
        .and_then(|path| std::fs::read_to_string(path).ok())
        .and_then(|content| serde_json::from_str::<serde_json::Value>(&content).ok())
        .and_then(|value| value.get("do_lower_case").and_then(|v| v.as_bool()));
    from_config.unwrap_or_else(|| lowercase_from_model_id(model_id))
}

fn lowercase_from_model_id(model_id: &str) -> bool {
    let id = model_id.to_lowercase();
    id.contains("uncased") || !id.contains("cased")
}

/// Build the standard BERT tokenizer pipeline around a `vocab.txt`.
pub(crate) fn wordpiece_tokenizer(vocab_path: &Path, lowercase: bool) -> Result<Tokenizer> {
    let content = std::fs::read_to_string(vocab_path)?;
    build_wordpiece(&content, lowercase)
}

fn build_wordpiece(vocab_content: &str, lowercase: bool) -> Result<Tokenizer> {
    let mut vocab = serde_json::Map::new();
    for (id, token) in vocab_content.lines().enumerate() {
        vocab.entry(token.to_string()).or_insert_with(|| json!(id));
    }
    let special_id = |token: &str| {
        vocab
            .get(token)
            .and_then(|v| v.as_u64())
            .ok_or_else(|| EmbedError::Tokenizer(format!("vocab.txt has no {token} token")))
    };
    let cls = special_id("[CLS]")?;
    let sep = special_id("[SEP]")?;
    special_id("[UNK]")?;
    info!("Loaded vocab with {} tokens", vocab.len());

    let definition = json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": {
            "type": "BertNormalizer",
            "clean_text": true,
            "handle_chinese_chars": true,
            "strip_accents": null,
            "lowercase": lowercase,
        },
        "pre_tokenizer": { "type": "BertPreTokenizer" },
        "post_processor": {
            "type": "BertProcessing",
            "sep": ["[SEP]", sep],
            "cls": ["[CLS]", cls],
        },
        "decoder": { "type": "WordPiece", "prefix": "##", "cleanup": true },
        "model": {
            "type": "WordPiece",
            "unk_token": "[UNK]",
            "continuing_subword_prefix": "##",
            "max_input_chars_per_word": 100,
            "vocab": vocab,
        },
    });

    Ok(Tokenizer::from_bytes(serde_json::to_vec(&definition)?)?)
}
