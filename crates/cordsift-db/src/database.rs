//! MongoDB connection handle.

use async_trait::async_trait;
use bson::{doc, Document};
use futures::{StreamExt, TryStreamExt};
use mongodb::{Client, Database as MongoDatabase};
use tracing::{debug, info};

use crate::error::{DbError, Result};
use crate::store::{DocStream, DocumentStore};

/// Main database handle.
#[derive(Clone)]
pub struct Database {
    db: MongoDatabase,
}

impl Database {
    /// Connect to `uri` and select database `name`.
    ///
    /// Issues a `ping` so that an unreachable server fails here rather than
    /// on the first cursor.
    pub async fn connect(uri: &str, name: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(name);
        db.run_command(doc! { "ping": 1 }).await?;
        info!(database = name, "Connected to MongoDB");
        Ok(Self { db })
    }

    /// Get the underlying driver handle.
    pub fn inner(&self) -> &MongoDatabase {
        &self.db
    }
}

#[async_trait]
impl DocumentStore for Database {
    async fn collection_names(&self) -> Result<Vec<String>> {
        let mut names = self.db.list_collection_names().await?;
        // The server returns collections in no particular order.
        names.sort();
        debug!(count = names.len(), "Listed collections");
        Ok(names)
    }

    async fn aggregate(&self, collection: &str, pipeline: Vec<Document>) -> Result<DocStream> {
        let cursor = self
            .db
            .collection::<Document>(collection)
            .aggregate(pipeline)
            .allow_disk_use(true)
            .await?;
        Ok(cursor.map_err(DbError::from).boxed())
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<DocStream> {
        let coll = self.db.collection::<Document>(collection);
        let find = coll.find(filter);
        let cursor = match projection {
            Some(projection) => find.projection(projection).await?,
            None => find.await?,
        };
        Ok(cursor.map_err(DbError::from).boxed())
    }
}
