//! Ad hoc lookup of raw documents across all collections.

use std::sync::Arc;

use bson::Document;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use tracing::instrument;

use crate::error::{DbError, Result};
use crate::filter::Filter;
use crate::store::DocumentStore;

/// One matching document and the collection it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub collection: String,
    pub document: Document,
}

/// Find documents matching `filter` in every collection, optionally
/// projected. Independent of text-unit reshaping.
#[instrument(skip(store, filter, projection))]
pub async fn search_collections<S>(
    store: Arc<S>,
    filter: Filter,
    projection: Option<Document>,
) -> Result<BoxStream<'static, Result<SearchHit>>>
where
    S: DocumentStore + ?Sized + 'static,
{
    let collections = store.collection_names().await?;
    let filter = filter.into_document();

    let hits = stream::iter(collections)
        .then(move |collection| {
            let store = Arc::clone(&store);
            let filter = filter.clone();
            let projection = projection.clone();
            async move {
                let docs = store.find(&collection, filter, projection).await?;
                Ok::<_, DbError>(docs.map_ok(move |document| SearchHit {
                    collection: collection.clone(),
                    document,
                }))
            }
        })
        .try_flatten();

    Ok(hits.boxed())
}
