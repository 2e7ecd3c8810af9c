use super::CodeEmbedder;
use super::indexing::do_create_embeddings;
use crate::config::LazyBuildStrategy;
use crate::embedding::EmbeddingProvider;
use crate::error::ValidationError;
use crate::git::{CheckoutGuard, GitRepo, Snapshot, resolve_commit_hash};
use crate::types::{EmbedReport, SearchRequest, SearchResponse};
use crate::vector_db::VectorCollection;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub(crate) async fn do_search_code<E: EmbeddingProvider + 'static>(
    client: &CodeEmbedder<E>,
    request: SearchRequest,
) -> Result<SearchResponse> {
    if request.query.trim().is_empty() {
        return Err(ValidationError::Empty("query".to_string()).into());
    }
    if request.k == 0 {
        return Err(ValidationError::ConstraintViolation {
            field: "k".to_string(),
            constraint: "greater than 0".to_string(),
            actual: "0".to_string(),
        }
        .into());
    }

    let start = Instant::now();
    let commit_hash = resolve_commit_hash(request.commit.as_deref(), &request.workdir)?;
    let collection_name = client.config.collection_name(&commit_hash);

    let mut lazy_build = None;
    if client.vector_store.count(&collection_name).await? == 0 {
        tracing::info!(
            "No embeddings found for commit {}. Creating embeddings...",
            commit_hash
        );
        let report = match client.config.search.lazy_build {
            LazyBuildStrategy::Checkout => {
                build_via_checkout(client, &commit_hash, &request.workdir).await?
            }
            LazyBuildStrategy::Snapshot => {
                build_via_snapshot(client, &commit_hash, &request.workdir).await?
            }
        };
        lazy_build = Some(report);
    }

    let collection = client
        .vector_store
        .open_or_create(&collection_name, client.embedding_provider.dimension())
        .await
        .with_context(|| format!("Failed to open collection '{}'", collection_name))?;

    let query_vector = client
        .embed_texts(vec![request.query.clone()])
        .await
        .context("Failed to generate query embedding")?
        .into_iter()
        .next()
        .context("No embedding generated for query")?;

    let results = collection
        .similarity_search(query_vector, request.k)
        .await
        .context("Failed to search collection")?;

    tracing::info!(
        "Search for '{}' in {} returned {} results in {} ms",
        request.query,
        collection_name,
        results.len(),
        start.elapsed().as_millis()
    );

    Ok(SearchResponse {
        query: request.query,
        commit_hash,
        results,
        lazy_build,
    })
}

/// Check `commit_hash` out in the working tree, build from `workdir`, then put
/// HEAD back whether or not the build succeeded
async fn build_via_checkout<E: EmbeddingProvider + 'static>(
    client: &CodeEmbedder<E>,
    commit_hash: &str,
    workdir: &Path,
) -> Result<EmbedReport> {
    let repo = GitRepo::discover(workdir)?;
    let guard = CheckoutGuard::checkout(repo, commit_hash)?;
    let original = guard
        .original()
        .map(ToString::to_string)
        .unwrap_or_default();

    let built = do_create_embeddings(client, workdir, Some(commit_hash)).await;
    let restored = guard.restore();

    finish_lazy_build(built, restored, commit_hash, &original)
}

/// Combine the outcome of a checkout build with the outcome of restoring HEAD.
///
/// A restore error is returned even when the build succeeded; the stored
/// collection is kept either way.
fn finish_lazy_build(
    built: Result<EmbedReport>,
    restored: Result<()>,
    commit_hash: &str,
    original: &str,
) -> Result<EmbedReport> {
    match (built, restored) {
        (Ok(report), Ok(())) => Ok(report),
        (Ok(_), Err(e)) => {
            tracing::error!(
                "Embeddings for {} were stored, but HEAD was not restored to {}",
                commit_hash,
                original
            );
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Err(build_err), Err(restore_err)) => {
            tracing::error!("Build for {} failed: {:#}", commit_hash, build_err);
            Err(restore_err)
        }
    }
}

/// Export `commit_hash` to a scratch directory and build from the part of it that
/// corresponds to `workdir`; the caller's working tree is never touched
async fn build_via_snapshot<E: EmbeddingProvider + 'static>(
    client: &CodeEmbedder<E>,
    commit_hash: &str,
    workdir: &Path,
) -> Result<EmbedReport> {
    let (snapshot, relative) = {
        let repo = GitRepo::discover(workdir)?;
        let relative = workdir_prefix(&repo, workdir)?;
        let snapshot = Snapshot::export(&repo, commit_hash, &client.config.search.snapshot_dir)?;
        (snapshot, relative)
    };
    tracing::info!(
        "Building {} from snapshot at {} ({} files)",
        commit_hash,
        snapshot.path().display(),
        snapshot.files()
    );

    do_create_embeddings(client, &snapshot.path().join(relative), Some(commit_hash)).await
}

/// Path of `workdir` inside the repository's working tree
fn workdir_prefix(repo: &GitRepo, workdir: &Path) -> Result<PathBuf> {
    let root = repo
        .workdir()
        .canonicalize()
        .context("Failed to resolve repository root")?;
    let workdir = workdir
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", workdir.display()))?;

    Ok(workdir
        .strip_prefix(&root)
        .map(Path::to_path_buf)
        .unwrap_or_default())
}
