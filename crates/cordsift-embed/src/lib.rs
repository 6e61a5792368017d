//! Sentence embeddings for cordsift.
//!
//! Pure Rust SciBERT embeddings using Candle (Hugging Face), with weights and
//! vocabulary fetched from the Hugging Face Hub.
//!
//! # Features
//! - 768-dim embeddings from `allenai/scibert_scivocab_uncased` by default
//! - Sum pooling over every token, `[CLS]` and `[SEP]` included
//! - Startup compatibility check between checkpoint, tokenizer and sequence length
//! - GPU support (CUDA, Metal) behind cargo features, CPU otherwise
//!
//! # Example
//! ```no_run
//! use cordsift_embed::{cosine_similarity, BertEmbedder, Embedder, EmbeddingConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let embedder = BertEmbedder::load(EmbeddingConfig::default()).await?;
//!
//!     let query = embedder.embed("Coronavirus cases exploded in March of 2020")?;
//!     let sentence = embedder.embed("Case counts rose sharply in spring 2020.")?;
//!     println!("similarity: {:.3}", cosine_similarity(&query, &sentence));
//!
//!     Ok(())
//! }
//! ```

pub mod compat;
pub mod config;
pub mod embedder;
pub mod error;
pub mod pooling;
pub mod similarity;

pub use compat::ModelSpec;
pub use config::EmbeddingConfig;
pub use embedder::{BertEmbedder, Embedder};
pub use error::{EmbedError, Result};
pub use pooling::PoolingStrategy;
pub use similarity::cosine_similarity;
