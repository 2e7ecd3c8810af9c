//! LanceDB vector store: one table per collection under a single persist directory

use crate::error::VectorDbError;
use crate::types::{DocumentChunk, MetadataFilter, SearchHit};
use crate::vector_db::{VectorCollection, filter_expression};
use anyhow::{Context, Result};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
    UInt32Array, types::Float32Type,
};
use arrow_schema::{DataType, Field, Schema};
use futures::stream::TryStreamExt;
use lancedb::Table;
use lancedb::connection::Connection;
use lancedb::query::{ExecutableQuery, QueryBase};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;

/// Connection to a persist directory holding any number of collections
pub struct LanceVectorStore {
    connection: Connection,
    persist_path: String,
}

/// Handle to a single collection table
pub struct LanceCollection {
    table: Table,
    name: String,
    dimension: usize,
}

impl LanceVectorStore {
    /// Connect to (creating if needed) the store rooted at `persist_path`
    pub async fn connect(persist_path: impl AsRef<Path>) -> Result<Self> {
        let path = persist_path.as_ref();
        let persist_path = path.to_string_lossy().to_string();
        tracing::info!("Connecting to LanceDB at: {}", persist_path);

        std::fs::create_dir_all(path).map_err(|e| VectorDbError::ConnectionFailed {
            path: persist_path.clone(),
            reason: e.to_string(),
        })?;

        let connection = lancedb::connect(&persist_path)
            .execute()
            .await
            .map_err(|e| VectorDbError::ConnectionFailed {
                path: persist_path.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            connection,
            persist_path,
        })
    }

    pub fn persist_path(&self) -> &str {
        &self.persist_path
    }

    /// Names of every collection in the store
    pub async fn collection_names(&self) -> Result<Vec<String>> {
        self.connection
            .table_names()
            .execute()
            .await
            .context("Failed to list tables")
    }

    pub async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collection_names().await?.iter().any(|n| n == name))
    }

    /// Open the named collection, creating it empty when missing.
    ///
    /// Fails if an existing collection was created with a different vector dimension.
    pub async fn open_or_create(&self, name: &str, dimension: usize) -> Result<LanceCollection> {
        if self.collection_exists(name).await? {
            let table = self
                .connection
                .open_table(name)
                .execute()
                .await
                .context("Failed to open table")?;

            let existing = stored_dimension(&table).await?;
            if existing != dimension {
                return Err(VectorDbError::CollectionCreationFailed {
                    collection: name.to_string(),
                    reason: format!(
                        "stored vectors have dimension {}, embedding model produces {}",
                        existing, dimension
                    ),
                }
                .into());
            }

            tracing::debug!("Opened existing collection '{}'", name);
            return Ok(LanceCollection {
                table,
                name: name.to_string(),
                dimension,
            });
        }

        let schema = create_schema(dimension);
        let empty_batch = RecordBatch::new_empty(schema.clone());
        let batches = RecordBatchIterator::new(vec![empty_batch].into_iter().map(Ok), schema);

        let table = self
            .connection
            .create_table(name, Box::new(batches))
            .execute()
            .await
            .map_err(|e| VectorDbError::CollectionCreationFailed {
                collection: name.to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!("Created collection '{}' (dimension {})", name, dimension);
        Ok(LanceCollection {
            table,
            name: name.to_string(),
            dimension,
        })
    }

    /// Record count of the named collection; a missing collection counts as empty
    pub async fn count(&self, name: &str) -> Result<usize> {
        if !self.collection_exists(name).await? {
            return Ok(0);
        }

        let table = self
            .connection
            .open_table(name)
            .execute()
            .await
            .context("Failed to open table")?;
        table.count_rows(None).await.context("Failed to count rows")
    }
}

#[async_trait::async_trait]
impl VectorCollection for LanceCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn add(&self, chunks: &[DocumentChunk], vectors: Vec<Vec<f32>>) -> Result<usize> {
        if chunks.len() != vectors.len() {
            return Err(VectorDbError::LengthMismatch {
                chunks: chunks.len(),
                vectors: vectors.len(),
            }
            .into());
        }
        if chunks.is_empty() {
            return Ok(0);
        }

        let schema = create_schema(self.dimension);
        let batch = create_record_batch(chunks, vectors, self.dimension, schema.clone())?;
        let count = batch.num_rows();
        let batches = RecordBatchIterator::new(vec![batch].into_iter().map(Ok), schema);

        self.table
            .add(Box::new(batches))
            .execute()
            .await
            .map_err(|e| VectorDbError::StoreFailed(e.to_string()))?;

        tracing::debug!("Stored {} records in '{}'", count, self.name);
        Ok(count)
    }

    async fn delete_where(&self, filter: &MetadataFilter) -> Result<()> {
        let predicate = filter_expression(filter)?;

        self.table
            .delete(&predicate)
            .await
            .map_err(|e| VectorDbError::DeleteFailed(e.to_string()))?;

        tracing::debug!("Deleted records in '{}' where {}", self.name, predicate);
        Ok(())
    }

    async fn similarity_search(&self, query_vector: Vec<f32>, k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 || self.count().await? == 0 {
            return Ok(Vec::new());
        }

        let stream = self
            .table
            .vector_search(query_vector)
            .map_err(|e| VectorDbError::SearchFailed(e.to_string()))?
            .limit(k)
            .execute()
            .await
            .map_err(|e| VectorDbError::SearchFailed(e.to_string()))?;

        let batches: Vec<RecordBatch> = stream
            .try_collect()
            .await
            .context("Failed to collect search results")?;

        let mut hits = Vec::new();
        for batch in &batches {
            hits.extend(hits_from_batch(batch)?);
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    async fn count(&self) -> Result<usize> {
        self.table
            .count_rows(None)
            .await
            .context("Failed to count rows")
    }
}

fn create_schema(dimension: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                dimension as i32,
            ),
            false,
        ),
        Field::new("id", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
        Field::new("file_type", DataType::Utf8, false),
        Field::new("commit_hash", DataType::Utf8, false),
        Field::new("chunk_index", DataType::UInt32, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("indexed_at", DataType::Utf8, false),
    ]))
}

async fn stored_dimension(table: &Table) -> Result<usize> {
    let schema = table.schema().await.context("Failed to read table schema")?;
    schema
        .fields()
        .iter()
        .find(|field| field.name() == "vector")
        .and_then(|field| match field.data_type() {
            DataType::FixedSizeList(_, size) => Some(*size as usize),
            _ => None,
        })
        .context("Table has no fixed-size vector column")
}

/// Stable record id derived from the chunk's identity and content
pub(crate) fn record_id(chunk: &DocumentChunk) -> String {
    let mut hasher = Sha256::new();
    hasher.update(chunk.commit_hash.as_bytes());
    hasher.update(b":");
    hasher.update(chunk.source.as_bytes());
    hasher.update(b":");
    hasher.update(chunk.chunk_index.to_string().as_bytes());
    hasher.update(b":");
    hasher.update(chunk.text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn create_record_batch(
    chunks: &[DocumentChunk],
    vectors: Vec<Vec<f32>>,
    dimension: usize,
    schema: Arc<Schema>,
) -> Result<RecordBatch> {
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
        anyhow::bail!(
            "Vector has dimension {}, collection expects {}",
            bad.len(),
            dimension
        );
    }

    let vector_array = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
        vectors.into_iter().map(|v| Some(v.into_iter().map(Some))),
        dimension as i32,
    );

    let id_array = StringArray::from(chunks.iter().map(record_id).collect::<Vec<_>>());
    let source_array =
        StringArray::from(chunks.iter().map(|c| c.source.as_str()).collect::<Vec<_>>());
    let file_type_array =
        StringArray::from(chunks.iter().map(|c| c.file_type.as_str()).collect::<Vec<_>>());
    let commit_hash_array = StringArray::from(
        chunks
            .iter()
            .map(|c| c.commit_hash.as_str())
            .collect::<Vec<_>>(),
    );
    let chunk_index_array = UInt32Array::from(
        chunks
            .iter()
            .map(|c| c.chunk_index as u32)
            .collect::<Vec<_>>(),
    );
    let text_array = StringArray::from(chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>());

    let indexed_at = chrono::Utc::now().to_rfc3339();
    let indexed_at_array = StringArray::from(vec![indexed_at.as_str(); chunks.len()]);

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(vector_array),
            Arc::new(id_array),
            Arc::new(source_array),
            Arc::new(file_type_array),
            Arc::new(commit_hash_array),
            Arc::new(chunk_index_array),
            Arc::new(text_array),
            Arc::new(indexed_at_array),
        ],
    )
    .context("Failed to create RecordBatch")
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .with_context(|| format!("Missing {} column", name))?
        .as_any()
        .downcast_ref::<StringArray>()
        .with_context(|| format!("Invalid {} type", name))
}

fn hits_from_batch(batch: &RecordBatch) -> Result<Vec<SearchHit>> {
    let distance_array = batch
        .column_by_name("_distance")
        .context("Missing _distance column")?
        .as_any()
        .downcast_ref::<Float32Array>()
        .context("Invalid _distance type")?;
    let text_array = string_column(batch, "text")?;
    let source_array = string_column(batch, "source")?;
    let file_type_array = string_column(batch, "file_type")?;
    let commit_hash_array = string_column(batch, "commit_hash")?;

    Ok((0..batch.num_rows())
        .map(|i| SearchHit {
            text: text_array.value(i).to_string(),
            source: source_array.value(i).to_string(),
            file_type: file_type_array.value(i).to_string(),
            commit_hash: commit_hash_array.value(i).to_string(),
            distance: distance_array.value(i),
        })
        .collect())
}
