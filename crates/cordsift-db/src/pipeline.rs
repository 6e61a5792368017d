//! Aggregation pipelines that reshape paper documents.
//!
//! Two reshaping modes exist:
//!
//! - [`ReshapeMode::SinglePass`] fetches each paper once (projected down to
//!   the fields that carry prose) and flattens it client-side, so every text
//!   unit is built together with its context.
//! - [`ReshapeMode::Parallel`] runs a text pipeline and a context pipeline
//!   independently and pairs their outputs positionally. Both pipelines use
//!   the same concatenation order; any divergence truncates the pairing.

use bson::{doc, Document};
use serde::{Deserialize, Serialize};

use crate::filter::Filter;
use cordsift_common::paper::{
    FIELD_ABSTRACT, FIELD_BIB_ENTRIES, FIELD_BODY_TEXT, FIELD_METADATA, FIELD_PAPER_ID,
    FIELD_REF_ENTRIES,
};

/// Field holding one flattened string in the text pipeline output.
pub const TEXT_OUTPUT_FIELD: &str = "all_text";
/// Field holding one context object in the context pipeline output.
pub const CONTEXT_OUTPUT_FIELD: &str = "context";

/// How papers are turned into `(text, context)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReshapeMode {
    #[default]
    SinglePass,
    Parallel,
}

impl std::str::FromStr for ReshapeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_pass" | "single-pass" => Ok(ReshapeMode::SinglePass),
            "parallel" => Ok(ReshapeMode::Parallel),
            other => Err(format!("unknown reshape mode '{other}' (expected single_pass or parallel)")),
        }
    }
}

/// Fully assembled pipelines for one generator run.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelinePlan {
    SinglePass {
        papers: Vec<Document>,
    },
    Parallel {
        texts: Vec<Document>,
        contexts: Vec<Document>,
    },
}

impl PipelinePlan {
    /// Build the pipelines for `mode`, with `filter` applied identically to
    /// every pipeline.
    pub fn build(mode: ReshapeMode, filter: Option<&Filter>) -> Self {
        match mode {
            ReshapeMode::SinglePass => PipelinePlan::SinglePass {
                papers: with_filter(filter, paper_pipeline()),
            },
            ReshapeMode::Parallel => PipelinePlan::Parallel {
                texts: with_filter(filter, text_pipeline()),
                contexts: with_filter(filter, context_pipeline()),
            },
        }
    }

    pub fn mode(&self) -> ReshapeMode {
        match self {
            PipelinePlan::SinglePass { .. } => ReshapeMode::SinglePass,
            PipelinePlan::Parallel { .. } => ReshapeMode::Parallel,
        }
    }
}

/// Prepend the filter stages to `pipeline`.
///
/// A `$text` filter also sorts by descending relevance with `_id` as the
/// tie-break. The sort runs before any reshaping so units of one paper keep
/// their array order.
pub fn with_filter(filter: Option<&Filter>, pipeline: Vec<Document>) -> Vec<Document> {
    let Some(filter) = filter else {
        return pipeline;
    };

    let mut stages = vec![doc! { "$match": filter.as_document().clone() }];
    if filter.is_text_search() {
        stages.push(text_score_sort());
    }
    stages.extend(pipeline);
    stages
}

/// `$sort` stage ordering full-text matches by relevance.
pub fn text_score_sort() -> Document {
    doc! {
        "$sort": {
            "score": { "$meta": "textScore" },
            "_id": 1,
        }
    }
}

/// Project each paper down to the fields that carry prose.
pub fn paper_pipeline() -> Vec<Document> {
    vec![doc! {
        "$project": {
            FIELD_PAPER_ID: 1,
            FIELD_METADATA: 1,
            FIELD_ABSTRACT: 1,
            FIELD_BODY_TEXT: 1,
            FIELD_REF_ENTRIES: 1,
            FIELD_BIB_ENTRIES: 1,
        }
    }]
}

/// One output document per text unit: `{ all_text: <string> }`.
pub fn text_pipeline() -> Vec<Document> {
    vec![
        entries_to_arrays(),
        doc! {
            "$project": {
                TEXT_OUTPUT_FIELD: {
                    "$concatArrays": [
                        ["$metadata.title"],
                        "$abstract.text",
                        "$body_text.text",
                        "$refs.v.text",
                        "$bibs.v.title",
                    ]
                }
            }
        },
        doc! { "$unwind": format!("${TEXT_OUTPUT_FIELD}") },
    ]
}

/// One output document per text unit: `{ context, metadata, paper_id }`,
/// with the prose fields stripped from `context`.
pub fn context_pipeline() -> Vec<Document> {
    vec![
        entries_to_arrays(),
        doc! {
            "$project": {
                CONTEXT_OUTPUT_FIELD: {
                    "$concatArrays": [
                        ["$metadata"],
                        "$abstract",
                        "$body_text",
                        "$refs",
                        "$bibs",
                    ]
                },
                FIELD_METADATA: 1,
                FIELD_PAPER_ID: 1,
            }
        },
        doc! { "$unwind": format!("${CONTEXT_OUTPUT_FIELD}") },
        doc! {
            "$project": {
                "context.v.title": 0,
                "context.v.text": 0,
                "context.text": 0,
                "context.title": 0,
            }
        },
    ]
}

/// `ref_entries` / `bib_entries` are maps; turn them into `[{k, v}]` arrays
/// so they can be concatenated.
fn entries_to_arrays() -> Document {
    doc! {
        "$addFields": {
            "refs": { "$objectToArray": "$ref_entries" },
            "bibs": { "$objectToArray": "$bib_entries" },
        }
    }
}
