//! Integration test: a `VectorSearchEngine` and a `DocumentStore` sharing
//! one libSQL connection, the way a real embedding pipeline wires them
//! together (insert the document, insert its embedding, search, delete the
//! document and confirm the owned vector is gone too).

use hotfield_search::{SearchOptions, VectorSearchEngine};
use hotfield_store::{parse_filter, DocumentStore};

#[tokio::test]
async fn embedding_lifecycle_follows_its_document() {
    let mut store = DocumentStore::open_in_memory().await.unwrap();
    let engine = VectorSearchEngine::new(store.raw_conn());

    let doc = store
        .insert("articles", serde_json::json!({"title": "Rust ownership"}).into())
        .await
        .unwrap();
    engine
        .insert_vector(&doc.envelope.id, "articles", &[0.9, 0.1, 0.0], Some("demo-embed-v1"), None)
        .await
        .unwrap();

    let (hits, stats) = engine
        .search(&[1.0, 0.0, 0.0], &SearchOptions::new().with_collection("articles"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].vector_ref.document_id, doc.envelope.id);
    assert_eq!(stats.vectors_scanned, 1);

    let id_filter = parse_filter(&serde_json::json!({"_id": doc.envelope.id.clone()})).unwrap();
    store.delete_many("articles", &id_filter).await.unwrap();

    let (hits_after_delete, _) = engine.search(&[1.0, 0.0, 0.0], &SearchOptions::new()).await.unwrap();
    assert!(hits_after_delete.is_empty(), "deleting the document must cascade to its embedding");
}

#[tokio::test]
async fn two_embedding_models_coexist_per_document() {
    let store = DocumentStore::open_in_memory().await.unwrap();
    let engine = VectorSearchEngine::new(store.raw_conn());

    engine.insert_vector("doc-1", "articles", &[1.0, 0.0], Some("model-a"), None).await.unwrap();
    engine.insert_vector("doc-1", "articles", &[0.0, 1.0], Some("model-b"), None).await.unwrap();

    let (hits, stats) =
        engine.search(&[1.0, 0.0], &SearchOptions::new().with_model_name("model-a")).await.unwrap();
    assert_eq!(stats.vectors_scanned, 1);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].vector_ref.model_name.as_deref(), Some("model-a"));
}
