//! Cosine-similarity scan over a stream of text units.

use futures::{Stream, TryStreamExt};
use serde::Serialize;
use tracing::{debug, info, instrument};

use cordsift_common::TextUnit;
use cordsift_embed::{cosine_similarity, Embedder};

use crate::config::ScanConfig;
use crate::error::Result;
use crate::sentencizer::Sentencizer;
use crate::sink::{Match, MatchSink};

/// Counters for one completed scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub units: u64,
    pub sentences: u64,
    pub matches: u64,
}

/// Compares every sentence against a fixed query vector.
///
/// The query is embedded once, in [`SimilarityScanner::new`]. Sentences are
/// scored independently; no state is carried between them.
pub struct SimilarityScanner<E> {
    embedder: E,
    sentencizer: Sentencizer,
    query_vector: Vec<f32>,
    threshold: f32,
}

impl<E: Embedder> SimilarityScanner<E> {
    pub fn new(embedder: E, config: &ScanConfig, sentencizer: Sentencizer) -> Result<Self> {
        let query_vector = embedder.embed(&config.query)?;
        debug!(dimension = query_vector.len(), query = %config.query, "Embedded query");

        Ok(Self {
            embedder,
            sentencizer,
            query_vector,
            threshold: config.threshold,
        })
    }

    /// Cosine similarity of `sentence` to the query.
    pub fn score(&self, sentence: &str) -> Result<f32> {
        let vector = self.embedder.embed(sentence)?;
        Ok(cosine_similarity(&self.query_vector, &vector))
    }

    /// Consume `units`, sending every sentence scoring strictly above the
    /// threshold to `sink`. The first error of any kind ends the scan.
    #[instrument(skip_all, fields(model = %self.embedder.model_id(), threshold = self.threshold))]
    pub async fn scan<S, K>(&self, mut units: S, sink: &mut K) -> Result<ScanSummary>
    where
        S: Stream<Item = cordsift_db::Result<TextUnit>> + Unpin,
        K: MatchSink + ?Sized,
    {
        let mut summary = ScanSummary::default();

        while let Some(unit) = units.try_next().await? {
            summary.units += 1;
            for sentence in self.sentencizer.split(&unit.text) {
                summary.sentences += 1;
                let score = self.score(sentence)?;
                if score > self.threshold {
                    summary.matches += 1;
                    sink.accept(&Match {
                        sentence,
                        score,
                        context: &unit.context,
                    })?;
                }
            }
            if summary.units % 10_000 == 0 {
                debug!(units = summary.units, matches = summary.matches, "Scan progress");
            }
        }
        sink.flush()?;

        info!(
            units = summary.units,
            sentences = summary.sentences,
            matches = summary.matches,
            "Scan complete"
        );
        Ok(summary)
    }
}
