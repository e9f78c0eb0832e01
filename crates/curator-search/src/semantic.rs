//! Question-to-document similarity over stored summary embeddings.

use curator_core::{
    logging, EmbeddingBackend, Error, Result, SearchIndex, SimilarityResponse, Vector,
};
use tracing::{debug, info};

/// Scale `vector` to unit length. Zero vectors are returned unchanged.
pub fn l2_normalize(mut vector: Vector) -> Vector {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
    vector
}

/// Embed `question` and return the `top_k` documents closest to it on `field`.
pub async fn find_similar(
    index: &dyn SearchIndex,
    embedder: &dyn EmbeddingBackend,
    question: &str,
    field: &str,
    top_k: usize,
) -> Result<SimilarityResponse> {
    let start = std::time::Instant::now();

    let vector = embedder
        .embed_texts(&[question.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Embedding("No embedding returned for question".to_string()))?;
    debug!(
        subsystem = "search",
        component = "semantic",
        { logging::MODEL } = embedder.model_name(),
        dimension = vector.len(),
        "Question embedded"
    );

    let matches = index
        .similar_documents(field, &l2_normalize(vector), top_k)
        .await?;

    info!(
        subsystem = "search",
        component = "semantic",
        op = "find_similar",
        { logging::RESULT_COUNT } = matches.len(),
        { logging::DURATION_MS } = start.elapsed().as_millis() as u64,
        "Similarity query complete"
    );

    Ok(SimilarityResponse {
        question: question.to_string(),
        matches,
    })
}
