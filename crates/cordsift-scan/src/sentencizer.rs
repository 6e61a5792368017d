//! Rule-based sentence segmentation.
//!
//! A sentence ends after a run of terminal punctuation, optionally followed
//! by closing quotes or brackets, when the next character is whitespace or
//! the text ends, unless the token ending there is a configured
//! abbreviation such as "e.g." or "Dr.". "3.5" and "U.S.A" never split.

use std::collections::HashSet;

use crate::config::SentencizerConfig;

const CLOSING: &[char] = &['"', '\'', ')', ']', '}', '”', '’', '»', '」', '』', '）'];
const OPENING: &[char] = &['"', '\'', '(', '[', '{', '“', '‘', '«', '「', '『', '（'];

#[derive(Debug, Clone)]
pub struct Sentencizer {
    punct_chars: Vec<char>,
    abbreviations: HashSet<String>,
}

impl Default for Sentencizer {
    fn default() -> Self {
        Self::new(&SentencizerConfig::default())
    }
}

impl Sentencizer {
    pub fn new(config: &SentencizerConfig) -> Self {
        Self {
            punct_chars: config.punct_chars.clone(),
            abbreviations: config.abbreviations.iter().cloned().collect(),
        }
    }

    fn is_terminal(&self, c: char) -> bool {
        self.punct_chars.contains(&c)
    }

    /// Whether `piece` ends in an abbreviation rather than a sentence.
    fn ends_with_abbreviation(&self, piece: &str) -> bool {
        piece
            .split_whitespace()
            .next_back()
            .is_some_and(|token| self.abbreviations.contains(token.trim_start_matches(OPENING)))
    }

    /// Split `text` into trimmed, non-empty sentences in order.
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut sentences = Vec::new();
        let mut push = |piece: &'a str| {
            let sentence = piece.trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
        };

        let mut start = 0;
        let mut chars = text.char_indices().peekable();
        while let Some((_, c)) = chars.next() {
            if !self.is_terminal(c) {
                continue;
            }

            // Swallow the rest of the punctuation run and any closers.
            let mut end = text.len();
            while let Some(&(i, next)) = chars.peek() {
                if self.is_terminal(next) || CLOSING.contains(&next) {
                    chars.next();
                } else {
                    end = i;
                    break;
                }
            }

            let at_boundary = chars.peek().map_or(true, |&(_, next)| next.is_whitespace());
            if at_boundary && !self.ends_with_abbreviation(&text[start..end]) {
                push(&text[start..end]);
                start = end;
            }
        }
        push(&text[start..]);

        sentences
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn split(text: &str) -> Vec<&str> {
        Sentencizer::default().split(text)
    }

    #[test]
    fn test_splits_on_terminal_punctuation() {
        assert_eq!(
            split("Cases rose. Testing lagged! Why? Nobody knows."),
            vec!["Cases rose.", "Testing lagged!", "Why?", "Nobody knows."]
        );
    }

    #[test]
    fn test_trailing_text_without_punctuation() {
        assert_eq!(
            split("Coronavirus cases exploded in March of 2020"),
            vec!["Coronavirus cases exploded in March of 2020"]
        );
        assert_eq!(split("First. Then a fragment"), vec!["First.", "Then a fragment"]);
    }

    #[test]
    fn test_quotes_and_brackets_stay_with_sentence() {
        assert_eq!(
            split(r#"He said "stop." Then (briefly.) left."#),
            vec![r#"He said "stop.""#, "Then (briefly.)", "left."]
        );
    }

    #[test]
    fn test_no_split_inside_numbers_or_without_space() {
        assert_eq!(split("R0 was 2.5 in Wuhan."), vec!["R0 was 2.5 in Wuhan."]);
        assert_eq!(split("See U.S.A for data."), vec!["See U.S.A for data."]);
    }

    #[test]
    fn test_abbreviations_do_not_end_sentences() {
        assert_eq!(split("Use e.g. PCR."), vec!["Use e.g. PCR."]);
        assert_eq!(
            split("Symptoms vary, e.g. fever and cough, as shown by Dr. Li et al. in Wuhan."),
            vec!["Symptoms vary, e.g. fever and cough, as shown by Dr. Li et al. in Wuhan."]
        );
        assert_eq!(
            split("See (Fig. 2) for titers. Then stop."),
            vec!["See (Fig. 2) for titers.", "Then stop."]
        );
    }

    #[test]
    fn test_abbreviation_match_is_whole_token_and_case_sensitive() {
        // "Dr." is listed, "dr." and "ADr." are not.
        assert_eq!(split("Ask the dr. Now."), vec!["Ask the dr.", "Now."]);
        assert_eq!(split("Gene ADr. Next."), vec!["Gene ADr.", "Next."]);
    }

    #[test]
    fn test_empty_abbreviation_list_splits_everywhere() {
        let sentencizer = Sentencizer::new(&SentencizerConfig {
            abbreviations: Vec::new(),
            ..Default::default()
        });
        assert_eq!(sentencizer.split("Use e.g. PCR."), vec!["Use e.g.", "PCR."]);
    }

    #[test]
    fn test_punctuation_runs_and_ellipsis() {
        assert_eq!(split("Really?! Yes… done"), vec!["Really?!", "Yes…", "done"]);
    }

    #[test]
    fn test_empty_and_whitespace_yield_nothing() {
        assert!(split("").is_empty());
        assert!(split("   \n\t").is_empty());
        assert!(split(" . ").len() == 1);
    }

    #[test]
    fn test_custom_punctuation() {
        let sentencizer = Sentencizer::new(&SentencizerConfig {
            punct_chars: vec![';'],
            ..Default::default()
        });
        assert_eq!(sentencizer.split("a; b. c"), vec!["a;", "b. c"]);
    }

    #[test]
    fn test_sentences_are_substrings_in_order() {
        let text = "One. Two!  Three?\nFour";
        let mut cursor = 0;
        for sentence in split(text) {
            let found = text[cursor..].find(sentence).unwrap();
            cursor += found + sentence.len();
        }
        assert_eq!(cursor, text.len());
    }
}
