//! cordsift database layer
//!
//! Reads CORD-19 shaped paper documents from MongoDB and reshapes them into
//! a lazy stream of text units, each paired with its structural context.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use futures::TryStreamExt;
//! use cordsift_db::{text_units, Database, Filter, ReshapeMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Arc::new(Database::connect("mongodb://localhost:56789", "CORD-19").await?);
//!     let filter = Filter::parse_json(r#"{"metadata.title": {"$regex": "coronavirus"}}"#)?;
//!
//!     let mut units = text_units(db, Some(filter), ReshapeMode::SinglePass).await?;
//!     while let Some(unit) = units.try_next().await? {
//!         println!("{}", unit.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod filter;
pub mod generator;
pub mod pipeline;
pub mod reshape;
pub mod search;
pub mod store;

pub use database::Database;
pub use error::{DbError, Result};
pub use filter::{parse_projection, Filter};
pub use generator::{pair_streams, text_units, UnitStream};
pub use pipeline::{PipelinePlan, ReshapeMode};
pub use search::{search_collections, SearchHit};
pub use store::{DocStream, DocumentStore};
