//! Embed document summaries into a dense-vector field.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use curator_core::{
    defaults, logging, DocumentPatch, DocumentQuery, DocumentRecord, EmbeddingBackend, Result,
    RetryPolicy, SearchIndex, TransientPolicy,
};
use curator_search::l2_normalize;

use crate::handler::{JobContext, JobHandler, JobKind, JobReport};
use crate::handlers::triage;

/// Target field and failure handling for [`EmbeddingJob`].
#[derive(Debug, Clone)]
pub struct EmbeddingJobConfig {
    /// Field the vectors are written to.
    pub field: String,
    /// Add the dense-vector mapping before the first domain.
    pub add_mapping: bool,
    pub retry: RetryPolicy,
    pub transient_policy: TransientPolicy,
}

impl Default for EmbeddingJobConfig {
    fn default() -> Self {
        Self {
            field: defaults::VECTOR_FIELD.to_string(),
            add_mapping: false,
            retry: RetryPolicy::default(),
            transient_policy: TransientPolicy::default(),
        }
    }
}

/// Text embedded for a document: title and summary. `None` without a summary.
fn embedding_text(doc: &DocumentRecord) -> Option<String> {
    let summary = doc.non_empty_summary()?;
    let title = doc.title.as_deref().unwrap_or_default();
    Some(format!("{} \n{}", title, summary))
}

/// Writes normalized summary embeddings for documents that lack them.
pub struct EmbeddingJob {
    index: Arc<dyn SearchIndex>,
    embedder: Arc<dyn EmbeddingBackend>,
    config: EmbeddingJobConfig,
    mapping_added: AtomicBool,
}

impl EmbeddingJob {
    pub fn new(
        index: Arc<dyn SearchIndex>,
        embedder: Arc<dyn EmbeddingBackend>,
        config: EmbeddingJobConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            config,
            mapping_added: AtomicBool::new(false),
        }
    }

    async fn ensure_mapping(&self) -> Result<()> {
        if !self.config.add_mapping || self.mapping_added.load(Ordering::Acquire) {
            return Ok(());
        }
        self.index
            .add_vector_field(&self.config.field, self.embedder.dimension())
            .await?;
        self.mapping_added.store(true, Ordering::Release);
        info!(
            subsystem = "jobs",
            component = "embedding",
            field = %self.config.field,
            dimension = self.embedder.dimension(),
            "Vector field mapping added"
        );
        Ok(())
    }

    async fn embed(&self, text: String) -> Result<Vec<f32>> {
        let texts = vec![text];
        let mut vectors = self
            .config
            .retry
            .run("embed_texts", || self.embedder.embed_texts(&texts))
            .await?;
        Ok(vectors.pop().map(l2_normalize).unwrap_or_default())
    }
}

#[async_trait]
impl JobHandler for EmbeddingJob {
    fn kind(&self) -> JobKind {
        JobKind::Embedding
    }

    async fn execute(&self, ctx: &JobContext) -> Result<JobReport> {
        self.ensure_mapping().await?;

        let query = DocumentQuery::for_domain(ctx.domain())
            .with_date_range(ctx.date_range)
            .missing(self.config.field.as_str());
        let docs = self.index.fetch_documents(&query).await?;
        let mut report = JobReport {
            fetched: docs.len(),
            ..Default::default()
        };
        info!(
            subsystem = "jobs",
            component = "embedding",
            { logging::DOMAIN } = ctx.label(),
            { logging::RESULT_COUNT } = docs.len(),
            { logging::MODEL } = self.embedder.model_name(),
            "Documents without embeddings received"
        );

        let default_index = self.index.index_name();
        let total = docs.len();
        for (i, doc) in docs.iter().enumerate() {
            ctx.report_progress(i, total, None);
            let Some(text) = embedding_text(doc) else {
                report.skipped += 1;
                continue;
            };

            let vector = match self.embed(text).await {
                Ok(v) => v,
                Err(e) => {
                    triage(e, self.config.transient_policy, "embed_texts", &doc.id)?;
                    report.failed += 1;
                    continue;
                }
            };
            if vector.is_empty() {
                warn!(
                    subsystem = "jobs",
                    component = "embedding",
                    { logging::DOC_ID } = %doc.id,
                    "Empty embedding returned"
                );
                report.skipped += 1;
                continue;
            }
            report.processed += 1;

            let patch = DocumentPatch::new()
                .set(self.config.field.as_str(), vector)
                .with_upsert(true);
            match self
                .index
                .update_document(doc.index_or(default_index), &doc.id, &patch)
                .await
            {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    triage(e, self.config.transient_policy, "update_document", &doc.id)?;
                    report.failed += 1;
                }
            }
        }

        ctx.report_progress(total, total, Some("done"));
        Ok(report)
    }
}
