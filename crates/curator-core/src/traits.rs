//! Core traits for the collaborators the pipelines talk to.
//!
//! Jobs depend on these traits rather than on concrete clients so that the
//! search index and the model providers can be swapped for in-memory fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts.
    ///
    /// Returns a vector of embedding vectors, one per input text.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// Get the expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate text with system context.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

// =============================================================================
// SEARCH INDEX TRAITS
// =============================================================================

/// Document store the pipelines read from and write back to.
///
/// `fetch_documents` must return hits in the order the index produced them;
/// the duplicate resolver's keep-last rule depends on it.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Check that the index is reachable.
    async fn ping(&self) -> Result<()>;

    /// Fetch every document matching the query, in fetch order.
    async fn fetch_documents(&self, query: &DocumentQuery) -> Result<Vec<DocumentRecord>>;

    /// Apply a partial update to one document.
    async fn update_document(&self, index: &str, id: &str, patch: &DocumentPatch) -> Result<()>;

    /// Delete one document by id.
    async fn delete_document(&self, index: &str, id: &str) -> Result<()>;

    /// Count documents of a domain, or of the whole index when `None`.
    async fn count_documents(&self, domain: Option<&str>) -> Result<u64>;

    /// Add a dense vector field to the index mapping.
    async fn add_vector_field(&self, field: &str, dimension: usize) -> Result<()>;

    /// Documents closest to `vector` on `field`, best first.
    async fn similar_documents(
        &self,
        field: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SimilarDocument>>;

    /// Name of the default index.
    fn index_name(&self) -> &str;
}
