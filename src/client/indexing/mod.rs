use super::CodeEmbedder;
use crate::embedding::EmbeddingProvider;
use crate::error::{IndexingError, is_fatal_error};
use crate::git::resolve_commit_hash;
use crate::indexer::{FileCollector, file_type_of, relative_source};
use crate::types::{DocumentChunk, EmbedReport, MetadataFilter};
use crate::vector_db::{LanceCollection, VectorCollection};
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;

/// Embed every eligible file under `directory` into the collection of `commit`
/// (HEAD of the enclosing repository when `None`)
pub(crate) async fn do_create_embeddings<E: EmbeddingProvider + 'static>(
    client: &CodeEmbedder<E>,
    directory: &Path,
    commit: Option<&str>,
) -> Result<EmbedReport> {
    let start = Instant::now();

    if !directory.exists() {
        return Err(IndexingError::DirectoryNotFound(directory.display().to_string()).into());
    }
    if !directory.is_dir() {
        return Err(IndexingError::NotADirectory(directory.display().to_string()).into());
    }
    let root = directory
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", directory.display()))?;

    let commit_hash = resolve_commit_hash(commit, &root)?;
    let collection_name = client.config.collection_name(&commit_hash);
    tracing::info!(
        "Embedding {} into collection '{}'",
        root.display(),
        collection_name
    );

    let collection = client
        .vector_store
        .open_or_create(&collection_name, client.embedding_provider.dimension())
        .await
        .with_context(|| format!("Failed to open collection '{}'", collection_name))?;

    let files = FileCollector::from_config(&root, &client.config.indexing).collect()?;

    let mut report = EmbedReport {
        commit_hash,
        collection: collection_name,
        files_discovered: files.len(),
        ..Default::default()
    };

    for path in &files {
        let source = relative_source(&root, path);

        match embed_file(client, &collection, path, &source, &report.commit_hash).await {
            Ok(0) => report.files_skipped += 1,
            Ok(stored) => {
                report.files_processed += 1;
                report.chunks_stored += stored;
                tracing::debug!("Embedded {} ({} chunks)", source, stored);
            }
            Err(e) if is_fatal_error(&e) => {
                tracing::error!("Aborting build at {}: {:#}", source, e);
                return Err(e.context(format!("Build of {} aborted", report.collection)));
            }
            Err(e) => {
                tracing::error!("Error processing {}: {:#}", source, e);
                report.errors.push(format!("{}: {:#}", source, e));
            }
        }
    }

    report.duration_ms = start.elapsed().as_millis() as u64;

    if report.files_processed == 0 {
        tracing::warn!(
            "No files were embedded under {} ({} discovered)",
            root.display(),
            report.files_discovered
        );
    }

    tracing::info!(
        "Processed {}/{} files ({} skipped, {} failed, {} chunks) for commit {} in {} ms",
        report.files_processed,
        report.files_discovered,
        report.files_skipped,
        report.errors.len(),
        report.chunks_stored,
        report.commit_hash,
        report.duration_ms
    );

    Ok(report)
}

/// Replace the records of one file under one commit. Returns the number of
/// chunks stored; 0 means the file produced no chunks and was skipped.
async fn embed_file<E: EmbeddingProvider + 'static>(
    client: &CodeEmbedder<E>,
    collection: &LanceCollection,
    path: &Path,
    source: &str,
    commit_hash: &str,
) -> Result<usize> {
    let content =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| IndexingError::FileReadFailed {
                file: source.to_string(),
                reason: e.to_string(),
            })?;

    let stale = MetadataFilter::source_at_commit(source, commit_hash);

    let texts = client.chunker.split(&content);
    if texts.is_empty() {
        // Content that used to produce chunks must not leave them behind
        collection.delete_where(&stale).await?;
        tracing::info!("Skipping {}: no chunks", source);
        return Ok(0);
    }

    let file_type = file_type_of(path);
    let chunks: Vec<DocumentChunk> = texts
        .into_iter()
        .enumerate()
        .map(|(chunk_index, text)| DocumentChunk {
            text,
            source: source.to_string(),
            file_type: file_type.clone(),
            commit_hash: commit_hash.to_string(),
            chunk_index,
        })
        .collect();

    let vectors = client
        .embed_texts(chunks.iter().map(|c| c.text.clone()).collect())
        .await
        .context("Failed to generate embeddings")?;

    collection.delete_where(&stale).await?;
    collection.add(&chunks, vectors).await
}

#[cfg(test)]
mod tests;
