//! Similarity query flow against in-memory collaborators.

use std::sync::Mutex;

use async_trait::async_trait;
use curator_core::{
    DocumentPatch, DocumentQuery, DocumentRecord, EmbeddingBackend, Error, Result, SearchIndex,
    SimilarDocument, Vector,
};
use curator_search::find_similar;

struct FixedEmbedder {
    vector: Option<Vector>,
}

#[async_trait]
impl EmbeddingBackend for FixedEmbedder {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        Ok(texts.iter().filter_map(|_| self.vector.clone()).collect())
    }

    fn dimension(&self) -> usize {
        2
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

#[derive(Default)]
struct RecordingIndex {
    queries: Mutex<Vec<(String, Vec<f32>, usize)>>,
}

#[async_trait]
impl SearchIndex for RecordingIndex {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn fetch_documents(&self, _query: &DocumentQuery) -> Result<Vec<DocumentRecord>> {
        Ok(Vec::new())
    }

    async fn update_document(&self, _index: &str, _id: &str, _patch: &DocumentPatch) -> Result<()> {
        Ok(())
    }

    async fn delete_document(&self, _index: &str, _id: &str) -> Result<()> {
        Ok(())
    }

    async fn count_documents(&self, _domain: Option<&str>) -> Result<u64> {
        Ok(0)
    }

    async fn add_vector_field(&self, _field: &str, _dimension: usize) -> Result<()> {
        Ok(())
    }

    async fn similar_documents(
        &self,
        field: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SimilarDocument>> {
        self.queries
            .lock()
            .unwrap()
            .push((field.to_string(), vector.to_vec(), top_k));
        Ok(vec![SimilarDocument {
            title: Some("Fork resolution".into()),
            summary: Some("Orphaned blocks return their transactions to the mempool.".into()),
            score: Some(1.93),
        }])
    }

    fn index_name(&self) -> &str {
        "test-index"
    }
}

#[tokio::test]
async fn test_find_similar_normalizes_query_vector() {
    let index = RecordingIndex::default();
    let embedder = FixedEmbedder {
        vector: Some(vec![0.0, 2.0]),
    };

    let response = find_similar(&index, &embedder, "How are forks merged?", "summary_vector", 3)
        .await
        .unwrap();

    assert_eq!(response.question, "How are forks merged?");
    assert_eq!(response.matches.len(), 1);
    assert_eq!(response.matches[0].title.as_deref(), Some("Fork resolution"));

    let queries = index.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].0, "summary_vector");
    assert_eq!(queries[0].1, vec![0.0, 1.0]);
    assert_eq!(queries[0].2, 3);
}

#[tokio::test]
async fn test_find_similar_without_embedding_fails() {
    let index = RecordingIndex::default();
    let embedder = FixedEmbedder { vector: None };

    let err = find_similar(&index, &embedder, "q", "summary_vector", 3)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Embedding(_)));
    assert!(index.queries.lock().unwrap().is_empty());
}
