//! Lazy `(text, context)` generator over every collection.
//!
//! Collections are visited one at a time; a collection's cursor is opened
//! only once the previous one is exhausted. The stream is single-pass and
//! cannot be restarted without calling [`text_units`] again.

use std::sync::Arc;

use futures::stream::{self, BoxStream};
use futures::{future, StreamExt, TryStreamExt};
use tracing::{debug, info, instrument, warn};

use crate::error::{DbError, Result};
use crate::filter::Filter;
use crate::pipeline::{PipelinePlan, ReshapeMode};
use crate::reshape;
use crate::store::{DocStream, DocumentStore};
use cordsift_common::TextUnit;

pub type UnitStream = BoxStream<'static, Result<TextUnit>>;

/// Produce text units from every collection in `store`.
///
/// The filter, when given, is applied identically to every pipeline. A
/// server-side query error surfaces as an `Err` item (or as the returned
/// error when listing collections fails) and is never swallowed.
#[instrument(skip(store, filter), fields(filtered = filter.is_some()))]
pub async fn text_units<S>(
    store: Arc<S>,
    filter: Option<Filter>,
    mode: ReshapeMode,
) -> Result<UnitStream>
where
    S: DocumentStore + ?Sized + 'static,
{
    let plan = PipelinePlan::build(mode, filter.as_ref());
    let collections = store.collection_names().await?;
    info!(collections = collections.len(), ?mode, "Reshaping papers");

    let units = stream::iter(collections)
        .then(move |collection| {
            let store = Arc::clone(&store);
            let plan = plan.clone();
            async move { collection_units(store.as_ref(), collection, plan).await }
        })
        .try_flatten();

    Ok(units.boxed())
}

async fn collection_units<S>(store: &S, collection: String, plan: PipelinePlan) -> Result<UnitStream>
where
    S: DocumentStore + ?Sized,
{
    debug!(collection = %collection, "Aggregating collection");
    match plan {
        PipelinePlan::SinglePass { papers } => {
            let papers = store.aggregate(&collection, papers).await?;
            let units = papers
                .map_ok(move |paper| {
                    let units = reshape::flatten_paper(&paper, &collection);
                    stream::iter(units.into_iter().map(Ok::<_, DbError>))
                })
                .try_flatten();
            Ok(units.boxed())
        }
        PipelinePlan::Parallel { texts, contexts } => {
            let texts = store.aggregate(&collection, texts).await?;
            let contexts = store.aggregate(&collection, contexts).await?;
            Ok(pair_streams(texts, contexts, collection))
        }
    }
}

struct Pairing {
    texts: DocStream,
    contexts: DocStream,
    collection: String,
    paired: usize,
}

/// Pair text-pipeline and context-pipeline outputs positionally.
///
/// The pairing stops at the end of the shorter stream. Divergent lengths
/// mean the two pipelines disagreed about a paper's shape; this is logged
/// and the surplus is dropped.
pub fn pair_streams(texts: DocStream, contexts: DocStream, collection: String) -> UnitStream {
    let start = Pairing {
        texts,
        contexts,
        collection,
        paired: 0,
    };

    stream::unfold(Some(start), |state| async move {
        let mut state = state?;
        let item = match (state.texts.next().await, state.contexts.next().await) {
            (Some(Ok(text)), Some(Ok(context))) => {
                state.paired += 1;
                Ok(reshape::pair_outputs(&text, &context, &state.collection))
            }
            (Some(Err(err)), _) | (_, Some(Err(err))) => return Some((Err(err), None)),
            (None, None) => {
                debug!(collection = %state.collection, paired = state.paired, "Collection exhausted");
                return None;
            }
            (text, _) => {
                warn!(
                    collection = %state.collection,
                    paired = state.paired,
                    longer = if text.is_some() { "text" } else { "context" },
                    "Text and context streams diverged, truncating"
                );
                return None;
            }
        };
        Some((item, Some(state)))
    })
    .try_filter_map(|unit| future::ready(Ok(unit)))
    .boxed()
}
