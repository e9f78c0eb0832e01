//! Delete re-ingested copies of the same document.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use curator_core::{logging, DocumentQuery, Result, SearchIndex, TransientPolicy};
use curator_search::{resolve_duplicates_with, DeduplicationConfig};

use crate::handler::{JobContext, JobHandler, JobKind, JobReport};
use crate::handlers::triage;

/// Fetches a domain, resolves duplicates, and deletes the losers.
pub struct DuplicateCleanupJob {
    index: Arc<dyn SearchIndex>,
    config: DeduplicationConfig,
    dry_run: bool,
    transient_policy: TransientPolicy,
}

impl DuplicateCleanupJob {
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self {
            index,
            config: DeduplicationConfig::default(),
            dry_run: false,
            transient_policy: TransientPolicy::default(),
        }
    }

    pub fn with_config(mut self, config: DeduplicationConfig) -> Self {
        self.config = config;
        self
    }

    /// Log what would be deleted without deleting anything.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_transient_policy(mut self, policy: TransientPolicy) -> Self {
        self.transient_policy = policy;
        self
    }
}

#[async_trait]
impl JobHandler for DuplicateCleanupJob {
    fn kind(&self) -> JobKind {
        JobKind::DuplicateCleanup
    }

    async fn execute(&self, ctx: &JobContext) -> Result<JobReport> {
        let query = DocumentQuery::for_domain(ctx.domain()).with_date_range(ctx.date_range);
        let docs = self.index.fetch_documents(&query).await?;
        let mut report = JobReport {
            fetched: docs.len(),
            ..Default::default()
        };
        if docs.is_empty() {
            info!(
                subsystem = "jobs",
                component = "dedup",
                { logging::DOMAIN } = ctx.label(),
                "No documents received"
            );
            return Ok(report);
        }

        let resolution = resolve_duplicates_with(&docs, &self.config);
        report.processed = resolution.grouped_count();
        report.skipped = resolution.skipped_ids.len();

        let default_index = self.index.index_name();
        let index_of: HashMap<&str, &str> = docs
            .iter()
            .map(|doc| (doc.id.as_str(), doc.index_or(default_index)))
            .collect();
        let total = resolution.delete_ids.len();
        for (i, id) in resolution.delete_ids.iter().enumerate() {
            if self.dry_run {
                info!(
                    subsystem = "jobs",
                    component = "dedup",
                    { logging::DOC_ID } = %id,
                    "Dry run, would delete"
                );
                continue;
            }

            let index_name = index_of.get(id.as_str()).copied().unwrap_or(default_index);
            match self.index.delete_document(index_name, id).await {
                Ok(()) => {
                    report.deleted += 1;
                    info!(
                        subsystem = "jobs",
                        component = "dedup",
                        { logging::DOC_ID } = %id,
                        "Deleted duplicate"
                    );
                }
                Err(e) => {
                    triage(e, self.transient_policy, "delete_document", id)?;
                    report.failed += 1;
                }
            }
            ctx.report_progress(i + 1, total, None);
        }

        Ok(report)
    }
}
