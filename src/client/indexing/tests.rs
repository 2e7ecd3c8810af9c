use super::*;
use crate::client::{MockClient, test_config};
use crate::embedding::mock::MockEmbedder;
use crate::error::EmbeddingError;
use crate::git::fixtures::TestRepo;
use crate::types::{EmbedRequest, SearchHit};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct Setup {
    _temp_dir: TempDir,
    code_dir: PathBuf,
    client: MockClient,
}

async fn setup() -> Setup {
    let temp_dir = TempDir::new().unwrap();
    let code_dir = temp_dir.path().join("code");
    fs::create_dir_all(&code_dir).unwrap();
    let client = MockClient::with_mock(test_config(&temp_dir.path().join("store")))
        .await
        .unwrap();
    Setup {
        _temp_dir: temp_dir,
        code_dir,
        client,
    }
}

fn request(dir: &Path, commit: &str) -> EmbedRequest {
    EmbedRequest {
        directory: dir.to_path_buf(),
        commit: Some(commit.to_string()),
    }
}

/// Every record of a collection, found by searching with a large k
async fn all_hits(client: &MockClient, commit: &str) -> Vec<SearchHit> {
    let collection = client
        .vector_store
        .open_or_create(&client.config.collection_name(commit), 64)
        .await
        .unwrap();
    let query = client.embed_texts(vec!["x".to_string()]).await.unwrap();
    collection
        .similarity_search(query.into_iter().next().unwrap(), 1000)
        .await
        .unwrap()
}

fn long_text(word: &str, words: usize) -> String {
    (0..words)
        .map(|i| format!("{}{}", word, i))
        .collect::<Vec<_>>()
        .join(" ")
}

#[tokio::test]
async fn test_rebuild_is_idempotent() {
    let s = setup().await;
    fs::write(s.code_dir.join("a.py"), long_text("alpha", 400)).unwrap();
    fs::write(s.code_dir.join("b.js"), "export const b = 1;").unwrap();

    let first = s.client.create_embeddings(request(&s.code_dir, "c1")).await.unwrap();
    let count_after_first = s.client.collection_count("c1").await.unwrap();
    let second = s.client.create_embeddings(request(&s.code_dir, "c1")).await.unwrap();

    assert_eq!(first.chunks_stored, second.chunks_stored);
    assert_eq!(count_after_first, first.chunks_stored);
    assert_eq!(s.client.collection_count("c1").await.unwrap(), count_after_first);

    let mut texts: Vec<_> = all_hits(&s.client, "c1")
        .await
        .into_iter()
        .map(|h| (h.source, h.text))
        .collect();
    texts.sort();
    texts.dedup();
    assert_eq!(texts.len(), count_after_first);
}

#[tokio::test]
async fn test_changed_file_supersedes_old_chunks() {
    let s = setup().await;
    let file = s.code_dir.join("a.py");

    fs::write(&file, long_text("old", 400)).unwrap();
    s.client.create_embeddings(request(&s.code_dir, "c1")).await.unwrap();

    fs::write(&file, "def new_version(): return 2").unwrap();
    let report = s.client.create_embeddings(request(&s.code_dir, "c1")).await.unwrap();

    assert_eq!(report.chunks_stored, 1);
    let hits = all_hits(&s.client, "c1").await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "def new_version(): return 2");
}

#[tokio::test]
async fn test_file_emptied_between_builds_leaves_no_chunks() {
    let s = setup().await;
    let file = s.code_dir.join("a.py");

    fs::write(&file, "def f(): pass").unwrap();
    s.client.create_embeddings(request(&s.code_dir, "c1")).await.unwrap();
    assert_eq!(s.client.collection_count("c1").await.unwrap(), 1);

    fs::write(&file, "").unwrap();
    let report = s.client.create_embeddings(request(&s.code_dir, "c1")).await.unwrap();

    assert_eq!(report.files_skipped, 1);
    assert_eq!(s.client.collection_count("c1").await.unwrap(), 0);
}

#[tokio::test]
async fn test_commits_are_isolated() {
    let s = setup().await;
    fs::write(s.code_dir.join("a.py"), "def f(): pass").unwrap();

    s.client.create_embeddings(request(&s.code_dir, "c1")).await.unwrap();
    s.client.create_embeddings(request(&s.code_dir, "c2")).await.unwrap();

    let names = s.client.vector_store.collection_names().await.unwrap();
    assert!(names.contains(&"code_embeddings_c1".to_string()));
    assert!(names.contains(&"code_embeddings_c2".to_string()));

    let c1 = s
        .client
        .vector_store
        .open_or_create("code_embeddings_c1", 64)
        .await
        .unwrap();
    c1.delete_where(&MetadataFilter::source_at_commit("a.py", "c1"))
        .await
        .unwrap();

    assert_eq!(s.client.collection_count("c1").await.unwrap(), 0);
    assert_eq!(s.client.collection_count("c2").await.unwrap(), 1);
    assert!(
        all_hits(&s.client, "c2")
            .await
            .iter()
            .all(|h| h.commit_hash == "c2")
    );
}

#[tokio::test]
async fn test_empty_file_is_skipped() {
    let s = setup().await;
    fs::write(s.code_dir.join("empty.py"), "").unwrap();
    fs::write(s.code_dir.join("blank.md"), "  \n\n\t ").unwrap();

    let report = s.client.create_embeddings(request(&s.code_dir, "c1")).await.unwrap();

    assert_eq!(report.files_discovered, 2);
    assert_eq!(report.files_processed, 0);
    assert_eq!(report.files_skipped, 2);
    assert!(report.errors.is_empty());
    assert_eq!(s.client.collection_count("c1").await.unwrap(), 0);
}

#[tokio::test]
async fn test_per_file_errors_do_not_abort_the_build() {
    let temp_dir = TempDir::new().unwrap();
    let code_dir = temp_dir.path().join("code");
    fs::create_dir_all(&code_dir).unwrap();
    fs::write(code_dir.join("bad.py"), "print('BROKEN')").unwrap();
    fs::write(code_dir.join("binary.js"), [0xff, 0xfe, 0x00, 0x81]).unwrap();
    fs::write(code_dir.join("good.py"), "def ok(): return 1").unwrap();

    let client = CodeEmbedder::with_provider(
        test_config(&temp_dir.path().join("store")),
        MockEmbedder::default().failing_on("BROKEN"),
    )
    .await
    .unwrap();

    let report = client.create_embeddings(request(&code_dir, "c1")).await.unwrap();

    assert_eq!(report.files_discovered, 3);
    assert_eq!(report.files_processed, 1);
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors.iter().any(|e| e.starts_with("bad.py:")));
    assert!(report.errors.iter().any(|e| e.starts_with("binary.js:")));
    assert_eq!(client.collection_count("c1").await.unwrap(), 1);
}

/// Embedder whose model is unusable, as after a panic while holding its lock
struct PoisonedEmbedder;

impl EmbeddingProvider for PoisonedEmbedder {
    fn embed_many(&self, _texts: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
        Err(EmbeddingError::LockPoisoned("model thread panicked".to_string()).into())
    }

    fn dimension(&self) -> usize {
        64
    }

    fn model_name(&self) -> &str {
        "poisoned"
    }
}

#[tokio::test]
async fn test_fatal_embedding_error_aborts_the_build() {
    let temp_dir = TempDir::new().unwrap();
    let code_dir = temp_dir.path().join("code");
    fs::create_dir_all(&code_dir).unwrap();
    fs::write(code_dir.join("a.py"), "def a(): pass").unwrap();
    fs::write(code_dir.join("b.py"), "def b(): pass").unwrap();

    let client = CodeEmbedder::with_provider(
        test_config(&temp_dir.path().join("store")),
        PoisonedEmbedder,
    )
    .await
    .unwrap();

    let err = client
        .create_embeddings(request(&code_dir, "c1"))
        .await
        .unwrap_err();

    assert!(is_fatal_error(&err));
    assert!(format!("{:#}", err).contains("model thread panicked"));
    assert!(err.to_string().contains("code_embeddings_c1"));
    assert_eq!(client.collection_count("c1").await.unwrap(), 0);
}

#[tokio::test]
async fn test_no_eligible_files_is_not_an_error() {
    let s = setup().await;
    fs::write(s.code_dir.join("notes.txt"), "not in the allow-list").unwrap();

    let report = s.client.create_embeddings(request(&s.code_dir, "c1")).await.unwrap();

    assert_eq!(report.files_discovered, 0);
    assert_eq!(report.files_processed, 0);
    assert_eq!(report.collection, "code_embeddings_c1");
}

#[tokio::test]
async fn test_sources_are_relative_and_typed() {
    let s = setup().await;
    fs::create_dir_all(s.code_dir.join("src/app")).unwrap();
    fs::write(s.code_dir.join("src/app/main.ts"), "export function main() {}").unwrap();
    fs::create_dir_all(s.code_dir.join("node_modules/x")).unwrap();
    fs::write(s.code_dir.join("node_modules/x/index.js"), "module.exports = 1").unwrap();

    s.client.create_embeddings(request(&s.code_dir, "c1")).await.unwrap();
    let hits = all_hits(&s.client, "c1").await;

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].source, "src/app/main.ts");
    assert_eq!(hits[0].file_type, ".ts");
    assert_eq!(hits[0].commit_hash, "c1");
}

#[tokio::test]
async fn test_invalid_commit_is_rejected() {
    let s = setup().await;
    let result = s
        .client
        .create_embeddings(request(&s.code_dir, "not a hash"))
        .await;
    assert!(result.is_err());
    assert!(s.client.vector_store.collection_names().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_default_commit_is_head() {
    let fixture = TestRepo::new();
    fixture.write("a.py", "def f(): pass");
    let head = fixture.commit_all("initial");
    let store_dir = TempDir::new().unwrap();
    let client = MockClient::with_mock(test_config(store_dir.path())).await.unwrap();

    let report = client
        .create_embeddings(EmbedRequest {
            directory: fixture.path().to_path_buf(),
            commit: None,
        })
        .await
        .unwrap();

    assert_eq!(report.commit_hash, head);
    assert_eq!(report.collection, format!("code_embeddings_{}", head));
    assert_eq!(report.files_processed, 1);
}

#[tokio::test]
async fn test_directory_must_be_a_directory() {
    let s = setup().await;
    let file = s.code_dir.join("a.py");
    fs::write(&file, "x = 1").unwrap();

    let err = s
        .client
        .create_embeddings(request(&file, "c1"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not a directory"));
}
