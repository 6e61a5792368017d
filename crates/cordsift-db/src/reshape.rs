//! Client-side flattening of paper documents into text units.

use bson::{Bson, Document};
use tracing::debug;

use crate::pipeline::{CONTEXT_OUTPUT_FIELD, TEXT_OUTPUT_FIELD};
use cordsift_common::paper::{
    ContextKind, TextUnit, UnitContext, FIELD_METADATA, FIELD_PAPER_ID, FIELD_TEXT, FIELD_TITLE,
};

/// Flatten one paper into its text units.
///
/// Order: title, abstract paragraphs, body paragraphs, reference texts,
/// bibliography titles, each in insertion order. Text and context are built
/// together; an entry without a string text field is dropped as a whole.
pub fn flatten_paper(paper: &Document, collection: &str) -> Vec<TextUnit> {
    let paper_id = paper.get_str(FIELD_PAPER_ID).ok().map(str::to_string);
    let metadata = paper.get_document(FIELD_METADATA).cloned().unwrap_or_default();

    let mut units = Vec::new();
    let mut push = |kind: ContextKind, key: Option<&str>, source: &Document| {
        let field = kind.text_field();
        match source.get(field) {
            Some(Bson::String(text)) => units.push(TextUnit::new(
                text.clone(),
                UnitContext {
                    paper_id: paper_id.clone(),
                    collection: collection.to_string(),
                    kind: Some(kind),
                    key: key.map(str::to_string),
                    metadata: metadata.clone(),
                    detail: strip_prose(source),
                },
            )),
            _ => debug!(
                paper_id = ?paper_id,
                kind = %kind,
                key = ?key,
                "Skipping entry without string {field}"
            ),
        }
    };

    for kind in ContextKind::ORDER {
        match kind {
            ContextKind::Title => push(kind, None, &metadata),
            ContextKind::Abstract | ContextKind::Body => {
                for paragraph in paper.get_array(kind.paper_field()).into_iter().flatten() {
                    if let Bson::Document(paragraph) = paragraph {
                        push(kind, None, paragraph);
                    }
                }
            }
            ContextKind::Reference | ContextKind::Bibliography => {
                let Ok(entries) = paper.get_document(kind.paper_field()) else {
                    continue;
                };
                for (key, entry) in entries {
                    if let Bson::Document(entry) = entry {
                        push(kind, Some(key.as_str()), entry);
                    }
                }
            }
        }
    }

    units
}

/// Pair one text-pipeline output with one context-pipeline output.
///
/// Returns `None` when the text side is not a string (MongoDB emits `null`
/// for a paper without a title).
pub fn pair_outputs(text: &Document, context: &Document, collection: &str) -> Option<TextUnit> {
    let Ok(unit_text) = text.get_str(TEXT_OUTPUT_FIELD) else {
        debug!(collection, "Skipping non-string text unit");
        return None;
    };

    let raw = context.get_document(CONTEXT_OUTPUT_FIELD).cloned().unwrap_or_default();
    // Reference and bibliography entries arrive as {k, v} pairs.
    let (key, detail) = match (raw.get_str("k"), raw.get_document("v")) {
        (Ok(key), Ok(value)) => (Some(key.to_string()), value.clone()),
        _ => (None, raw),
    };

    Some(TextUnit::new(
        unit_text,
        UnitContext {
            paper_id: context.get_str(FIELD_PAPER_ID).ok().map(str::to_string),
            collection: collection.to_string(),
            kind: None,
            key,
            metadata: context.get_document(FIELD_METADATA).cloned().unwrap_or_default(),
            detail,
        },
    ))
}

fn strip_prose(source: &Document) -> Document {
    let mut detail = source.clone();
    detail.remove(FIELD_TEXT);
    detail.remove(FIELD_TITLE);
    detail
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use pretty_assertions::assert_eq;

    fn sample_paper() -> Document {
        doc! {
            "paper_id": "0015023cc06b5362d332b3baf348d11567ca2fbb",
            "metadata": {
                "title": "The RNA pseudoknots in foot-and-mouth disease virus",
                "authors": [ { "first": "Joseph", "last": "Ward" } ],
            },
            "abstract": [
                { "text": "Word count: 194.", "cite_spans": [], "section": "Abstract" },
                { "text": "Pseudoknots are dispensable.", "cite_spans": [], "section": "Abstract" },
            ],
            "body_text": [
                { "text": "VP3 is exposed.", "cite_spans": [ { "start": 0, "end": 3 } ], "section": "Introduction" },
                { "text": "Replication was measured.", "cite_spans": [], "section": "Methods" },
                { "text": "Results follow.", "cite_spans": [], "section": "Results" },
            ],
            "ref_entries": {
                "FIGREF0": { "text": "Figure 1: Genome map.", "type": "figure" },
            },
            "bib_entries": {
                "BIBREF0": { "title": "Genetics of FMDV", "year": 2018 },
                "BIBREF1": { "title": "Picornavirus replication", "year": 2006 },
            },
        }
    }

    #[test]
    fn test_unit_count_matches_paper_shape() {
        let units = flatten_paper(&sample_paper(), "biorxiv");
        // 1 title + 2 abstract + 3 body + 1 ref + 2 bib
        assert_eq!(units.len(), 1 + 2 + 3 + 1 + 2);
    }

    #[test]
    fn test_unit_order_follows_concatenation() {
        let units = flatten_paper(&sample_paper(), "biorxiv");
        let kinds: Vec<ContextKind> = units.iter().filter_map(|u| u.context.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ContextKind::Title,
                ContextKind::Abstract,
                ContextKind::Abstract,
                ContextKind::Body,
                ContextKind::Body,
                ContextKind::Body,
                ContextKind::Reference,
                ContextKind::Bibliography,
                ContextKind::Bibliography,
            ]
        );
        assert_eq!(units[0].text, "The RNA pseudoknots in foot-and-mouth disease virus");
        assert_eq!(units[3].text, "VP3 is exposed.");
        assert_eq!(units[8].text, "Picornavirus replication");
        assert_eq!(units[8].context.key.as_deref(), Some("BIBREF1"));
    }

    #[test]
    fn test_unit_order_ignores_field_order_in_document() {
        let paper = doc! {
            "bib_entries": { "BIBREF0": { "title": "Cited work" } },
            "ref_entries": { "TABREF0": { "text": "Table 1." } },
            "body_text": [ { "text": "Body." } ],
            "abstract": [ { "text": "Abstract." } ],
            "metadata": { "title": "Title" },
        };
        let kinds: Vec<ContextKind> = flatten_paper(&paper, "pmc")
            .iter()
            .filter_map(|u| u.context.kind)
            .collect();
        assert_eq!(kinds, ContextKind::ORDER.to_vec());
    }

    #[test]
    fn test_context_strips_prose_and_keeps_structure() {
        let units = flatten_paper(&sample_paper(), "biorxiv");
        let body = &units[3];
        assert!(!body.context.detail.contains_key("text"));
        assert_eq!(body.context.detail.get_str("section").unwrap(), "Introduction");
        assert_eq!(body.context.collection, "biorxiv");
        assert_eq!(body.paper_id(), Some("0015023cc06b5362d332b3baf348d11567ca2fbb"));

        let title = &units[0];
        assert!(!title.context.detail.contains_key("title"));
        assert!(title.context.detail.contains_key("authors"));
        // Full metadata travels with every unit.
        assert!(body.context.metadata.contains_key("title"));

        let bib = &units[7];
        assert_eq!(bib.context.detail, doc! { "year": 2018 });
    }

    #[test]
    fn test_entries_without_text_are_dropped_as_a_pair() {
        let paper = doc! {
            "paper_id": "p1",
            "metadata": { "authors": [] },
            "abstract": [ { "cite_spans": [] }, { "text": "Kept." } ],
            "body_text": [ { "text": 42 } ],
        };
        let units = flatten_paper(&paper, "pmc");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].text, "Kept.");
        assert_eq!(units[0].context.kind, Some(ContextKind::Abstract));
    }

    #[test]
    fn test_missing_sections_yield_only_title() {
        let paper = doc! { "metadata": { "title": "Only a title" } };
        let units = flatten_paper(&paper, "pmc");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].paper_id(), None);
    }

    #[test]
    fn test_pair_outputs_unwraps_entry_pairs() {
        let text = doc! { "all_text": "Genetics of FMDV" };
        let context = doc! {
            "paper_id": "p1",
            "metadata": { "title": "T" },
            "context": { "k": "BIBREF0", "v": { "year": 2018 } },
        };
        let unit = pair_outputs(&text, &context, "pmc").unwrap();
        assert_eq!(unit.context.key.as_deref(), Some("BIBREF0"));
        assert_eq!(unit.context.detail, doc! { "year": 2018 });
        assert_eq!(unit.context.kind, None);
    }

    #[test]
    fn test_pair_outputs_skips_null_text() {
        let text = doc! { "all_text": Bson::Null };
        let context = doc! { "context": { "authors": [] } };
        assert!(pair_outputs(&text, &context, "pmc").is_none());
    }
}
