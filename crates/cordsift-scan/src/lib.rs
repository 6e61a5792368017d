//! Sentence-level similarity scanning.
//!
//! Splits each text unit into sentences, embeds every sentence and reports
//! those whose cosine similarity to a query sentence exceeds a threshold.

pub mod config;
pub mod error;
pub mod scanner;
pub mod sentencizer;
pub mod sink;

pub use config::{OutputConfig, ScanConfig, SentencizerConfig};
pub use error::{Result, ScanError};
pub use scanner::{ScanSummary, SimilarityScanner};
pub use sentencizer::Sentencizer;
pub use sink::{CollectSink, Match, MatchSink, ScoredSentence, StdoutSink};
