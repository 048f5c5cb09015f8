//! Full-text index: the `DocumentSink` seam the worker publishes through,
//! a tantivy-backed implementation, and the query path.

pub mod indexer;
pub mod query;
pub mod schema;
mod tests;

pub use indexer::TantivySink;
pub use query::{SearchHit, SearchQuery};
pub use schema::SearchSchema;

use crate::models::IndexedDocument;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Index error: {0}")]
    Index(#[from] tantivy::TantivyError),
    #[error("Query error: {0}")]
    Query(#[from] tantivy::query::QueryParserError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// Destination for indexed documents.
///
/// Implementations must be idempotent under retry: submitting a document
/// with an id that already exists overwrites the previous version.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn index(&self, document: IndexedDocument) -> Result<()>;

    async fn bulk_index(&self, documents: Vec<IndexedDocument>) -> Result<()>;
}
