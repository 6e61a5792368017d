//! Paper document shape and the flattened text units derived from it.
//!
//! Papers follow the CORD-19 JSON schema: `metadata`, `abstract`,
//! `body_text`, `ref_entries`, `bib_entries` and `paper_id`. Every piece of
//! prose in a paper becomes one [`TextUnit`], paired with the structural
//! record it came from.

use bson::Document;
use serde::{Deserialize, Serialize};

// ── Paper field names ────────────────────────────────────────────────────────

pub const FIELD_PAPER_ID: &str = "paper_id";
pub const FIELD_METADATA: &str = "metadata";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_ABSTRACT: &str = "abstract";
pub const FIELD_BODY_TEXT: &str = "body_text";
pub const FIELD_REF_ENTRIES: &str = "ref_entries";
pub const FIELD_BIB_ENTRIES: &str = "bib_entries";
pub const FIELD_TEXT: &str = "text";

/// Where in the paper a text unit was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    Title,
    Abstract,
    Body,
    Reference,
    Bibliography,
}

impl ContextKind {
    /// Concatenation order of text units within one paper.
    pub const ORDER: [ContextKind; 5] = [
        ContextKind::Title,
        ContextKind::Abstract,
        ContextKind::Body,
        ContextKind::Reference,
        ContextKind::Bibliography,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextKind::Title => "title",
            ContextKind::Abstract => "abstract",
            ContextKind::Body => "body",
            ContextKind::Reference => "reference",
            ContextKind::Bibliography => "bibliography",
        }
    }

    /// Top-level paper field the source objects of this kind live under.
    pub fn paper_field(&self) -> &'static str {
        match self {
            ContextKind::Title => FIELD_METADATA,
            ContextKind::Abstract => FIELD_ABSTRACT,
            ContextKind::Body => FIELD_BODY_TEXT,
            ContextKind::Reference => FIELD_REF_ENTRIES,
            ContextKind::Bibliography => FIELD_BIB_ENTRIES,
        }
    }

    /// Field of the source object that holds the prose for this kind.
    pub fn text_field(&self) -> &'static str {
        match self {
            ContextKind::Title | ContextKind::Bibliography => FIELD_TITLE,
            _ => FIELD_TEXT,
        }
    }
}

impl std::fmt::Display for ContextKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-text structure accompanying a text unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnitContext {
    pub paper_id: Option<String>,
    pub collection: String,
    /// `None` when the unit came from the two-pipeline reshaping, which does
    /// not carry provenance.
    pub kind: Option<ContextKind>,
    /// Key into `ref_entries` / `bib_entries` for reference units.
    pub key: Option<String>,
    pub metadata: Document,
    /// The source object minus its `text` / `title` field: cite spans,
    /// ref spans, section, location and similar.
    pub detail: Document,
}

/// One flattened string from a paper, paired with its context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextUnit {
    pub text: String,
    pub context: UnitContext,
}

impl TextUnit {
    pub fn new(text: impl Into<String>, context: UnitContext) -> Self {
        Self {
            text: text.into(),
            context,
        }
    }

    pub fn paper_id(&self) -> Option<&str> {
        self.context.paper_id.as_deref()
    }
}
