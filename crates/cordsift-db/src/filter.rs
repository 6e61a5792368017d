//! Query filters in MongoDB's native dialect.
//!
//! Filters arrive as (Extended) JSON, are converted to BSON and checked for
//! unknown `$` operators before they reach the server, so a typo such as
//! `$regx` fails loudly instead of producing an empty result stream.

use bson::{Bson, Document};

use crate::error::{DbError, Result};

/// Query operators MongoDB accepts inside a `find` / `$match` filter.
const QUERY_OPERATORS: &[&str] = &[
    // comparison
    "$eq", "$gt", "$gte", "$in", "$lt", "$lte", "$ne", "$nin",
    // logical
    "$and", "$not", "$nor", "$or",
    // element
    "$exists", "$type",
    // evaluation
    "$expr", "$jsonSchema", "$mod", "$regex", "$options", "$text", "$search",
    "$language", "$caseSensitive", "$diacriticSensitive", "$where",
    // geospatial
    "$geoIntersects", "$geoWithin", "$near", "$nearSphere", "$box", "$center",
    "$centerSphere", "$geometry", "$maxDistance", "$minDistance", "$polygon",
    // array
    "$all", "$elemMatch", "$size",
    // bitwise
    "$bitsAllClear", "$bitsAllSet", "$bitsAnyClear", "$bitsAnySet",
    // misc
    "$comment",
];

/// Operators whose argument is not a query document and is left to the server.
const OPAQUE_OPERATORS: &[&str] = &["$expr", "$where", "$jsonSchema"];

/// A validated MongoDB query filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter(Document);

impl Filter {
    /// Wrap and validate a BSON filter document.
    pub fn new(doc: Document) -> Result<Self> {
        validate_document(&doc)?;
        Ok(Self(doc))
    }

    /// Parse a filter from JSON. Extended JSON (`{"$oid": ...}`) is accepted.
    pub fn parse_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        match Bson::try_from(value)? {
            Bson::Document(doc) => Self::new(doc),
            other => Err(DbError::InvalidQuery(format!(
                "filter must be a JSON object, got {:?}",
                other.element_type()
            ))),
        }
    }

    /// Whether this filter uses full-text search, at the top level or inside
    /// a logical combinator. Text-search results must be sorted by relevance
    /// for their order to be reproducible.
    pub fn is_text_search(&self) -> bool {
        contains_text(&self.0)
    }

    pub fn as_document(&self) -> &Document {
        &self.0
    }

    pub fn into_document(self) -> Document {
        self.0
    }
}

/// Parse an optional projection document from JSON.
pub fn parse_projection(json: &str) -> Result<Document> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    match Bson::try_from(value)? {
        Bson::Document(doc) => Ok(doc),
        _ => Err(DbError::InvalidQuery("projection must be a JSON object".to_string())),
    }
}

fn contains_text(doc: &Document) -> bool {
    if doc.contains_key("$text") {
        return true;
    }
    ["$and", "$or", "$nor"].iter().any(|op| match doc.get(*op) {
        Some(Bson::Array(clauses)) => clauses.iter().any(|clause| match clause {
            Bson::Document(clause) => contains_text(clause),
            _ => false,
        }),
        _ => false,
    })
}

fn validate_document(doc: &Document) -> Result<()> {
    for (key, value) in doc {
        if key.starts_with('$') {
            if !QUERY_OPERATORS.contains(&key.as_str()) {
                return Err(DbError::InvalidQuery(format!("unknown query operator {key}")));
            }
            if OPAQUE_OPERATORS.contains(&key.as_str()) {
                continue;
            }
        }
        validate_value(value)?;
    }
    Ok(())
}

fn validate_value(value: &Bson) -> Result<()> {
    match value {
        Bson::Document(doc) => validate_document(doc),
        Bson::Array(items) => items.iter().try_for_each(validate_value),
        _ => Ok(()),
    }
}
