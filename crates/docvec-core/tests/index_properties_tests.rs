//! End-to-end properties of the document index.

mod common;

use common::{corpus, TopicEmbedder};
use docvec_core::{Document, DocumentIndex, Error, GraphParams, HashingEmbedder, SearchRequest};
use std::sync::Arc;

fn topic_index() -> DocumentIndex {
    DocumentIndex::in_memory(
        GraphParams::new(TopicEmbedder::DIMENSION),
        Arc::new(TopicEmbedder::new()),
    )
    .expect("index")
}

fn hashing_index(dimension: usize) -> DocumentIndex {
    DocumentIndex::in_memory(
        GraphParams::new(dimension).with_max_connections(16),
        Arc::new(HashingEmbedder::new(dimension)),
    )
    .expect("index")
}

#[test]
fn test_topically_related_documents_rank_first() {
    // Arrange
    let index = topic_index();
    index
        .index_documents(&[
            Document::new("a", "cats are mammals"),
            Document::new("b", "dogs are mammals"),
            Document::new("c", "stocks rose today"),
        ])
        .expect("index");

    // Act
    let response = index
        .search(&SearchRequest::new("feline pets", 2))
        .expect("search");

    // Assert
    let mut ids: Vec<&str> = response.hits.iter().map(|h| h.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn test_duplicate_id_in_one_call() {
    let index = topic_index();

    let report = index
        .index_documents(&[
            Document::new("a", "cats are mammals"),
            Document::new("b", "dogs are mammals"),
            Document::new("a", "cats are mammals"),
        ])
        .expect("index");

    assert_eq!(report.accepted, 2);
    assert_eq!(report.skipped, 1);
}

#[test]
fn test_every_document_retrieves_itself() {
    let index = hashing_index(64);
    let docs = corpus("self", 300);
    index.index_documents(&docs).expect("index");

    for doc in &docs {
        let response = index
            .search(&SearchRequest::new(doc.text.clone(), 5).with_ef(100))
            .expect("search");
        assert!(
            response.hits.iter().any(|h| h.id == doc.id),
            "{} not retrieved by its own text",
            doc.id
        );
    }
}

#[test]
fn test_reinsertion_in_later_batch_changes_nothing() {
    let index = hashing_index(32);
    let docs = corpus("re", 50);
    index.index_documents(&docs).expect("index");
    let query = SearchRequest::new("copper lantern harbor", 10).with_ef(80);
    let before = index.search(&query).expect("search");
    let snapshot_before = index.snapshot().expect("snapshot");

    let report = index.index_documents(&docs[10..20]).expect("index");

    assert_eq!(report.accepted, 0);
    assert_eq!(report.skipped, 10);
    assert_eq!(index.search(&query).expect("search"), before);
    let snapshot_after = index.snapshot().expect("snapshot");
    assert_eq!(snapshot_after.entries, snapshot_before.entries);
}

#[test]
fn test_lengths_stay_equal_after_partially_rejected_batches() {
    let index = hashing_index(32);
    let first = corpus("len", 20);
    index.index_documents(&first).expect("index");

    let mut mixed = corpus("len", 30);
    mixed.extend(corpus("len", 5));
    let report = index.index_documents(&mixed).expect("index");

    assert_eq!(report.accepted, 10);
    assert_eq!(report.skipped, 25);
    let snapshot = index.snapshot().expect("snapshot");
    assert_eq!(snapshot.len(), index.len());
    assert_eq!(index.stats().documents, 30);
    for (i, entry) in snapshot.entries.iter().enumerate() {
        assert_eq!(index.id_at(i).as_deref(), Some(entry.id.as_str()));
    }
}

#[test]
fn test_empty_then_single_document() {
    let index = topic_index();
    assert!(matches!(
        index.search(&SearchRequest::new("cats", 3)),
        Err(Error::EmptyIndex)
    ));

    index
        .index_documents(&[Document::new("solo", "a single kitten")])
        .expect("index");
    let response = index
        .search(&SearchRequest::new("cats", 10))
        .expect("search");

    assert_eq!(response.hits.len(), 1);
    assert_eq!(response.hits[0].id, "solo");
}

#[test]
fn test_stats_reflect_graph_shape() {
    let index = hashing_index(32);
    index.index_documents(&corpus("st", 100)).expect("index");

    let stats = index.stats();

    assert_eq!(stats.documents, 100);
    assert_eq!(stats.dimension, 32);
    assert_eq!(stats.params.max_connections, 16);
    assert_eq!(stats.generation, 1);
    assert!(stats.entry_point.is_some());
}

#[test]
fn test_documents_sharing_one_text_are_all_findable() {
    for m in [GraphParams::MIN_MAX_CONNECTIONS, 16] {
        let index = DocumentIndex::in_memory(
            GraphParams::new(64).with_max_connections(m),
            Arc::new(HashingEmbedder::new(64)),
        )
        .expect("index");
        let distinct = corpus("mix", 300);
        let mut docs = Vec::new();
        for (i, doc) in distinct.iter().enumerate() {
            if i % 3 == 0 {
                docs.push(Document::new(format!("same-{i}"), "one boilerplate footer"));
            }
            docs.push(doc.clone());
        }
        let report = index.index_documents(&docs).expect("index");
        assert_eq!(report.accepted, 400);

        for doc in &distinct {
            let response = index
                .search(&SearchRequest::new(doc.text.clone(), 5).with_ef(512))
                .expect("search");
            assert!(
                response.hits.iter().any(|h| h.id == doc.id),
                "{} not retrieved by its own text with M = {m}",
                doc.id
            );
        }

        let response = index
            .search(&SearchRequest::new("one boilerplate footer", 100).with_ef(512))
            .expect("search");
        assert_eq!(response.hits.len(), 100);
        assert!(response.hits.iter().all(|h| h.id.starts_with("same-")));
    }
}
