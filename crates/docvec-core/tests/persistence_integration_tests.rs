//! Save / load behavior through the public API.

mod common;

use common::corpus;
use docvec_core::persistence::{GRAPH_FILE, IDS_FILE};
use docvec_core::{
    Document, DocumentIndex, DocvecConfig, EmbeddingProvider, Error, HashingEmbedder,
    SearchRequest,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn config_for(dir: &Path) -> DocvecConfig {
    let mut config = DocvecConfig::default();
    config.storage.data_dir = dir.to_path_buf();
    config.index.max_connections = 8;
    config.index.ef_construction = 64;
    config
}

fn embedder() -> Arc<dyn EmbeddingProvider> {
    Arc::new(HashingEmbedder::new(48))
}

#[test]
fn test_reload_returns_identical_results() {
    // Arrange
    let dir = tempdir().expect("tempdir");
    let config = config_for(dir.path());
    let index = DocumentIndex::open(&config, embedder()).expect("open");
    index.index_in_batches(&corpus("rt", 250)).expect("index");
    let queries = ["river cloud", "quartz saddle timber", "orbit 17", "violet harbor meadow"];
    let before: Vec<_> = queries
        .iter()
        .map(|q| index.search(&SearchRequest::new(*q, 10).with_ef(40)).expect("search"))
        .collect();
    let stats_before = index.stats();
    index.close().expect("close");

    // Act
    let reopened = DocumentIndex::open(&config, embedder()).expect("reopen");

    // Assert
    let after: Vec<_> = queries
        .iter()
        .map(|q| reopened.search(&SearchRequest::new(*q, 10).with_ef(40)).expect("search"))
        .collect();
    assert_eq!(after, before);
    let stats_after = reopened.stats();
    assert_eq!(stats_after.documents, stats_before.documents);
    assert_eq!(stats_after.entry_point, stats_before.entry_point);
    assert_eq!(stats_after.max_layer, stats_before.max_layer);
    assert_eq!(stats_after.corpus_fingerprint, stats_before.corpus_fingerprint);
}

#[test]
fn test_inserts_after_reload_continue_deterministically() {
    let dir_a = tempdir().expect("tempdir");
    let dir_b = tempdir().expect("tempdir");
    let docs = corpus("det", 120);

    // One process indexes everything.
    let straight = DocumentIndex::open(&config_for(dir_a.path()), embedder()).expect("open");
    straight.index_documents(&docs[..60]).expect("index");
    straight.index_documents(&docs[60..]).expect("index");

    // Another restarts halfway.
    let first = DocumentIndex::open(&config_for(dir_b.path()), embedder()).expect("open");
    first.index_documents(&docs[..60]).expect("index");
    first.close().expect("close");
    let second = DocumentIndex::open(&config_for(dir_b.path()), embedder()).expect("open");
    second.index_documents(&docs[60..]).expect("index");

    let query = SearchRequest::new("walnut zephyr engine", 8).with_ef(32);
    assert_eq!(
        second.search(&query).expect("search"),
        straight.search(&query).expect("search")
    );
}

#[test]
fn test_corrupt_graph_fails_closed() {
    let dir = tempdir().expect("tempdir");
    let config = config_for(dir.path());
    let index = DocumentIndex::open(&config, embedder()).expect("open");
    index.index_documents(&corpus("cg", 20)).expect("index");
    index.close().expect("close");

    let graph_path = dir.path().join(GRAPH_FILE);
    let bytes = std::fs::read(&graph_path).expect("read");
    std::fs::write(&graph_path, &bytes[..bytes.len() / 2]).expect("truncate");

    let result = DocumentIndex::open(&config, embedder());
    assert!(matches!(result, Err(Error::CorruptPersistedState(_))));
}

#[test]
fn test_missing_id_file_fails_closed() {
    let dir = tempdir().expect("tempdir");
    let config = config_for(dir.path());
    let index = DocumentIndex::open(&config, embedder()).expect("open");
    index.index_documents(&corpus("mi", 5)).expect("index");
    index.close().expect("close");

    std::fs::remove_file(dir.path().join(IDS_FILE)).expect("remove");

    let result = DocumentIndex::open(&config, embedder());
    assert!(matches!(result, Err(Error::CorruptPersistedState(_))));
}

#[test]
fn test_reopen_with_other_dimension_fails_closed() {
    let dir = tempdir().expect("tempdir");
    let config = config_for(dir.path());
    let index = DocumentIndex::open(&config, embedder()).expect("open");
    index.index_documents(&[Document::new("a", "alpha")]).expect("index");
    index.close().expect("close");

    let result = DocumentIndex::open(&config, Arc::new(HashingEmbedder::new(16)));
    assert!(matches!(
        result,
        Err(Error::DimensionMismatch { actual: 16, .. })
    ));
}

#[test]
fn test_interrupted_save_is_recovered_and_rewritten() {
    let dir = tempdir().expect("tempdir");
    let config = config_for(dir.path());
    let index = DocumentIndex::open(&config, embedder()).expect("open");
    index.index_documents(&corpus("cr", 10)).expect("index");
    index.close().expect("close");

    // Simulate a crash after ids.json of the next save was renamed.
    let ids_path = dir.path().join(IDS_FILE);
    let mut ids: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&ids_path).expect("read")).expect("json");
    ids["ids"]
        .as_array_mut()
        .expect("array")
        .push(serde_json::Value::from("cr-lost"));
    std::fs::write(&ids_path, serde_json::to_vec(&ids).expect("encode")).expect("write");

    let recovered = DocumentIndex::open(&config, embedder()).expect("open");
    assert_eq!(recovered.len(), 10);
    assert!(!recovered.contains("cr-lost"));
    assert!(recovered.flush().expect("flush"), "recovered state is rewritten");

    let written: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&ids_path).expect("read")).expect("json");
    assert_eq!(written["ids"].as_array().expect("array").len(), 10);
}

#[test]
fn test_snapshot_export_matches_index() {
    let dir = tempdir().expect("tempdir");
    let index = DocumentIndex::open(&config_for(dir.path()), embedder()).expect("open");
    index.index_documents(&corpus("sx", 12)).expect("index");

    let snapshot = index.snapshot().expect("snapshot");
    let mut out = Vec::new();
    snapshot.write_jsonl(&mut out).expect("write");

    let lines: Vec<&str> = std::str::from_utf8(&out).expect("utf8").lines().collect();
    assert_eq!(lines.len(), 12);
    let first: serde_json::Value = serde_json::from_str(lines[0]).expect("json");
    assert_eq!(first["id"], "sx-0");
    assert_eq!(first["vector"].as_array().expect("array").len(), 48);
}
