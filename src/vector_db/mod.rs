// LanceDB is the only backend: embedded, one table per collection
pub mod lance_client;
pub use lance_client::{LanceCollection, LanceVectorStore};

use crate::error::VectorDbError;
use crate::types::{DocumentChunk, MetadataFilter, SearchHit};
use anyhow::Result;

/// Operations on one named collection of (vector, text, metadata) records
#[async_trait::async_trait]
pub trait VectorCollection: Send + Sync {
    /// Collection name
    fn name(&self) -> &str;

    /// Append one record per chunk. `chunks` and `vectors` must have the same length.
    async fn add(&self, chunks: &[DocumentChunk], vectors: Vec<Vec<f32>>) -> Result<usize>;

    /// Remove every record whose metadata matches all set fields of `filter`
    async fn delete_where(&self, filter: &MetadataFilter) -> Result<()>;

    /// Up to `k` nearest records in ascending distance order
    async fn similarity_search(&self, query_vector: Vec<f32>, k: usize) -> Result<Vec<SearchHit>>;

    /// Number of records in the collection
    async fn count(&self) -> Result<usize>;
}

/// Quote a value as a SQL string literal, doubling embedded single quotes
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Build the SQL predicate for a metadata filter, AND-ing every set field.
///
/// An empty filter is rejected rather than matching everything.
pub fn filter_expression(filter: &MetadataFilter) -> Result<String, VectorDbError> {
    if filter.is_empty() {
        return Err(VectorDbError::EmptyFilter);
    }

    let mut clauses = Vec::new();
    if let Some(source) = &filter.source {
        clauses.push(format!("source = {}", sql_literal(source)));
    }
    if let Some(commit_hash) = &filter.commit_hash {
        clauses.push(format!("commit_hash = {}", sql_literal(commit_hash)));
    }
    Ok(clauses.join(" AND "))
}
