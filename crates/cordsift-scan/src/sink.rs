//! Destinations for matching sentences.

use std::io::{self, Write};

use cordsift_common::UnitContext;
use serde::Serialize;

use crate::config::OutputConfig;

/// A sentence that scored above the threshold.
#[derive(Debug, Clone, Copy)]
pub struct Match<'a> {
    pub sentence: &'a str,
    pub score: f32,
    pub context: &'a UnitContext,
}

/// Receives every match in scan order.
pub trait MatchSink {
    fn accept(&mut self, found: &Match<'_>) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes one match per line.
///
/// By default only the sentence is written. `show_score` prefixes the score
/// and `show_paper_id` appends the paper id, separated by tabs.
pub struct StdoutSink<W: Write = io::Stdout> {
    out: W,
    options: OutputConfig,
}

impl StdoutSink {
    pub fn stdout(options: OutputConfig) -> Self {
        Self::with_writer(io::stdout(), options)
    }
}

impl<W: Write> StdoutSink<W> {
    pub fn with_writer(out: W, options: OutputConfig) -> Self {
        Self { out, options }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MatchSink for StdoutSink<W> {
    fn accept(&mut self, found: &Match<'_>) -> io::Result<()> {
        if self.options.show_score {
            write!(self.out, "{:.4}\t", found.score)?;
        }
        self.out.write_all(found.sentence.as_bytes())?;
        if self.options.show_paper_id {
            let paper_id = found.context.paper_id.as_deref().unwrap_or("-");
            write!(self.out, "\t{paper_id}")?;
        }
        writeln!(self.out)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// An owned copy of a [`Match`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSentence {
    pub sentence: String,
    pub score: f32,
    pub context: UnitContext,
}

/// Keeps every match in memory.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub matches: Vec<ScoredSentence>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sentences(&self) -> Vec<&str> {
        self.matches.iter().map(|m| m.sentence.as_str()).collect()
    }
}

impl MatchSink for CollectSink {
    fn accept(&mut self, found: &Match<'_>) -> io::Result<()> {
        self.matches.push(ScoredSentence {
            sentence: found.sentence.to_string(),
            score: found.score,
            context: found.context.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn context() -> UnitContext {
        UnitContext {
            paper_id: Some("abc123".to_string()),
            collection: "pmc".to_string(),
            ..Default::default()
        }
    }

    fn render(options: OutputConfig) -> String {
        let context = context();
        let mut sink = StdoutSink::with_writer(Vec::new(), options);
        sink.accept(&Match { sentence: "Cases exploded.", score: 0.81234, context: &context })
            .unwrap();
        sink.accept(&Match { sentence: "Then plateaued.", score: 0.9, context: &context })
            .unwrap();
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn test_default_output_is_bare_sentences() {
        assert_eq!(
            render(OutputConfig::default()),
            "Cases exploded.\nThen plateaued.\n"
        );
    }

    #[test]
    fn test_score_and_paper_id_columns() {
        let output = render(OutputConfig { show_score: true, show_paper_id: true });
        assert_eq!(
            output,
            "0.8123\tCases exploded.\tabc123\n0.9000\tThen plateaued.\tabc123\n"
        );
    }

    #[test]
    fn test_collect_sink_keeps_context() {
        let context = context();
        let mut sink = CollectSink::new();
        sink.accept(&Match { sentence: "Cases exploded.", score: 0.8, context: &context })
            .unwrap();
        assert_eq!(sink.sentences(), vec!["Cases exploded."]);
        assert_eq!(sink.matches[0].context.collection, "pmc");
    }
}
