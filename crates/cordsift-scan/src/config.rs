//! Scan, output and sentencizer settings.

use cordsift_common::{CordsiftError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_QUERY: &str = "Coronavirus cases exploded in March of 2020";
pub const DEFAULT_THRESHOLD: f32 = 0.75;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_query")]
    pub query: String,
    /// Sentences scoring strictly above this are reported.
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// MongoDB query document as JSON, applied to every collection.
    #[serde(default)]
    pub filter: Option<String>,
}

fn default_query() -> String { DEFAULT_QUERY.to_string() }
fn default_threshold() -> f32 { DEFAULT_THRESHOLD }

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            query: default_query(),
            threshold: default_threshold(),
            filter: None,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(CordsiftError::Config("scan.query must not be empty".to_string()));
        }
        if !(-1.0..=1.0).contains(&self.threshold) {
            return Err(CordsiftError::Config(format!(
                "scan.threshold must lie in [-1, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Prefix each match with its similarity score.
    #[serde(default)]
    pub show_score: bool,
    /// Append the paper id to each match.
    #[serde(default)]
    pub show_paper_id: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentencizerConfig {
    #[serde(default = "default_punct_chars")]
    pub punct_chars: Vec<char>,
    /// Tokens whose final period never ends a sentence. Matched
    /// case-sensitively against the whole whitespace-delimited token.
    #[serde(default = "default_abbreviations")]
    pub abbreviations: Vec<String>,
}

fn default_punct_chars() -> Vec<char> {
    vec!['.', '!', '?', '…', '。', '！', '？', '؟', '।']
}

/// English abbreviations common in biomedical prose.
const DEFAULT_ABBREVIATIONS: &[&str] = &[
    // latin
    "e.g.", "E.g.", "i.e.", "I.e.", "et al.", "al.", "etc.", "vs.", "cf.", "Cf.", "ca.", "approx.",
    "resp.", "viz.",
    // titles
    "Dr.", "Drs.", "Mr.", "Mrs.", "Ms.", "Prof.", "St.", "Jr.", "Sr.",
    // references
    "Fig.", "Figs.", "fig.", "figs.", "Eq.", "Eqs.", "Ref.", "Refs.", "No.", "Nos.", "Vol.",
    "vol.", "pp.", "p.", "Suppl.", "Tab.",
    // months
    "Jan.", "Feb.", "Mar.", "Apr.", "Jun.", "Jul.", "Aug.", "Sep.", "Sept.", "Oct.", "Nov.",
    "Dec.",
];

fn default_abbreviations() -> Vec<String> {
    DEFAULT_ABBREVIATIONS.iter().map(|a| a.to_string()).collect()
}

impl Default for SentencizerConfig {
    fn default() -> Self {
        Self {
            punct_chars: default_punct_chars(),
            abbreviations: default_abbreviations(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scan_is_valid() {
        let config = ScanConfig::default();
        assert_eq!(config.query, DEFAULT_QUERY);
        assert_eq!(config.threshold, 0.75);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_bounds() {
        let mut config = ScanConfig::default();
        config.threshold = 1.0;
        assert!(config.validate().is_ok());
        config.threshold = -1.0;
        assert!(config.validate().is_ok());
        config.threshold = 1.5;
        assert!(matches!(config.validate(), Err(CordsiftError::Config(_))));
        config.threshold = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_query_rejected() {
        let config = ScanConfig {
            query: "   ".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("query"));
    }

    #[test]
    fn test_default_punctuation_covers_western_and_cjk() {
        let chars = SentencizerConfig::default().punct_chars;
        assert!(chars.contains(&'.'));
        assert!(chars.contains(&'。'));
    }

    #[test]
    fn test_default_abbreviations_cover_latin_and_titles() {
        let abbreviations = SentencizerConfig::default().abbreviations;
        for expected in ["e.g.", "i.e.", "al.", "Dr.", "Fig."] {
            assert!(abbreviations.iter().any(|a| a == expected), "missing {expected}");
        }
    }
}
