//! Push topics saved in the per-domain CSV files into the index.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use curator_core::{
    defaults, logging, DocumentPatch, DocumentQuery, Result, SearchIndex, TransientPolicy,
};

use crate::handler::{JobContext, JobHandler, JobKind, JobReport};
use crate::handlers::triage;
use crate::topic_store::TopicCsvStore;

/// Copies CSV topics onto documents still missing `primary_topics`.
pub struct PushTopicsJob {
    index: Arc<dyn SearchIndex>,
    output_dir: PathBuf,
    transient_policy: TransientPolicy,
}

impl PushTopicsJob {
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self {
            index,
            output_dir: PathBuf::from(defaults::OUTPUT_DIR),
            transient_policy: TransientPolicy::default(),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_transient_policy(mut self, policy: TransientPolicy) -> Self {
        self.transient_policy = policy;
        self
    }
}

#[async_trait]
impl JobHandler for PushTopicsJob {
    fn kind(&self) -> JobKind {
        JobKind::PushTopics
    }

    async fn execute(&self, ctx: &JobContext) -> Result<JobReport> {
        let path = TopicCsvStore::path_for(&self.output_dir, ctx.domain());
        if !path.exists() {
            warn!(
                subsystem = "jobs",
                component = "push_topics",
                { logging::DOMAIN } = ctx.label(),
                path = %path.display(),
                "CSV file not found, skipping domain"
            );
            return Ok(JobReport::default());
        }
        let store = TopicCsvStore::load(&path)?;

        let query = DocumentQuery::for_domain(ctx.domain())
            .with_date_range(ctx.date_range)
            .missing("primary_topics");
        let docs = self.index.fetch_documents(&query).await?;
        let mut report = JobReport {
            fetched: docs.len(),
            ..Default::default()
        };
        info!(
            subsystem = "jobs",
            component = "push_topics",
            { logging::DOMAIN } = ctx.label(),
            { logging::RESULT_COUNT } = docs.len(),
            rows = store.len(),
            "Pushing topics"
        );

        let default_index = self.index.index_name();
        let total = docs.len();
        for (i, doc) in docs.iter().enumerate() {
            ctx.report_progress(i, total, None);
            let row = doc.source_id.as_deref().and_then(|id| store.get(id));
            let Some(row) = row else {
                debug!(
                    subsystem = "jobs",
                    component = "push_topics",
                    { logging::DOC_ID } = %doc.id,
                    "No CSV row for document"
                );
                report.skipped += 1;
                continue;
            };
            report.processed += 1;

            let patch = DocumentPatch::topics(&row.primary_topics, &row.secondary_topics);
            match self
                .index
                .update_document(doc.index_or(default_index), &doc.id, &patch)
                .await
            {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    triage(e, self.transient_policy, "update_document", &doc.id)?;
                    report.failed += 1;
                }
            }
        }

        ctx.report_progress(total, total, Some("done"));
        Ok(report)
    }
}
