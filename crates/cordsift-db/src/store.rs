//! Storage seam between the reshaping logic and the database driver.

use async_trait::async_trait;
use bson::Document;
use futures::stream::BoxStream;

use crate::error::Result;

/// A lazily consumed stream of raw documents from one query.
pub type DocStream = BoxStream<'static, Result<Document>>;

/// Read-only access to a set of document collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Names of all collections, in the order they will be scanned.
    async fn collection_names(&self) -> Result<Vec<String>>;

    /// Run an aggregation pipeline against one collection.
    async fn aggregate(&self, collection: &str, pipeline: Vec<Document>) -> Result<DocStream>;

    /// Run a plain find against one collection.
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<DocStream>;
}
