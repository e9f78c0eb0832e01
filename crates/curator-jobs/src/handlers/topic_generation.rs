//! Generate primary and secondary topics for documents that have none.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use curator_core::{
    defaults, logging, preprocess_email, DocumentPatch, DocumentQuery, DocumentRecord, Result,
    SearchIndex,
};
use curator_inference::TopicModeler;

use crate::handler::{JobContext, JobHandler, JobKind, JobReport};
use crate::handlers::triage;
use crate::topic_store::{TopicCsvStore, TopicRow};

/// Where generated topics go and how often they are flushed.
#[derive(Debug, Clone)]
pub struct TopicGenerationConfig {
    /// Directory for the per-domain CSV files.
    pub output_dir: PathBuf,
    /// Record topics in the CSV store.
    pub save_csv: bool,
    /// Patch topics into the index as they are generated.
    pub update_index: bool,
    /// Save the CSV after this many processed documents.
    pub save_every: usize,
    /// Pause after each CSV save.
    pub save_delay: Duration,
}

impl Default for TopicGenerationConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(defaults::OUTPUT_DIR),
            save_csv: true,
            update_index: false,
            save_every: defaults::SAVE_EVERY,
            save_delay: Duration::from_millis(defaults::SAVE_DELAY_MS),
        }
    }
}

/// Text sent to topic modeling: the title, a newline, and the summary or,
/// failing that, the cleaned email body. `None` when there is no body text.
pub fn topic_text(doc: &DocumentRecord) -> Option<String> {
    let body = match doc.non_empty_summary() {
        Some(summary) => summary.to_string(),
        None => preprocess_email(doc.body.as_deref().unwrap_or_default()),
    };
    if body.trim().is_empty() {
        return None;
    }
    let title = doc.title.as_deref().unwrap_or_default();
    Some(format!("{}\n{}", title, body))
}

/// Runs topic modeling over a domain's untagged documents.
pub struct TopicGenerationJob {
    index: Arc<dyn SearchIndex>,
    modeler: Arc<TopicModeler>,
    config: TopicGenerationConfig,
}

impl TopicGenerationJob {
    pub fn new(
        index: Arc<dyn SearchIndex>,
        modeler: Arc<TopicModeler>,
        config: TopicGenerationConfig,
    ) -> Self {
        Self {
            index,
            modeler,
            config,
        }
    }

    async fn save(&self, store: Option<&TopicCsvStore>) -> Result<()> {
        let Some(store) = store else {
            return Ok(());
        };
        store.save()?;
        info!(
            subsystem = "jobs",
            component = "topic_generation",
            path = %store.path().display(),
            rows = store.len(),
            "CSV file saved"
        );
        if !self.config.save_delay.is_zero() {
            tokio::time::sleep(self.config.save_delay).await;
        }
        Ok(())
    }
}

#[async_trait]
impl JobHandler for TopicGenerationJob {
    fn kind(&self) -> JobKind {
        JobKind::TopicGeneration
    }

    async fn execute(&self, ctx: &JobContext) -> Result<JobReport> {
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
            component = "topic_generation",
            { logging::DOMAIN } = ctx.label(),
            { logging::RESULT_COUNT } = docs.len(),
            "Documents without primary_topics received"
        );
        if docs.is_empty() {
            return Ok(report);
        }

        let mut store = if self.config.save_csv {
            Some(TopicCsvStore::open(TopicCsvStore::path_for(
                &self.config.output_dir,
                ctx.domain(),
            ))?)
        } else {
            None
        };

        let default_index = self.index.index_name();
        let total = docs.len();
        for (i, doc) in docs.iter().enumerate() {
            ctx.report_progress(i, total, None);
            let source_id = doc.source_id.as_deref().unwrap_or_default();

            let already_stored = store
                .as_ref()
                .is_some_and(|s| doc.source_id.is_some() && s.contains(source_id));
            if already_stored || !doc.primary_topics.is_empty() {
                report.skipped += 1;
                continue;
            }

            let Some(text) = topic_text(doc) else {
                warn!(
                    subsystem = "jobs",
                    component = "topic_generation",
                    { logging::DOC_ID } = %doc.id,
                    "Body text not found"
                );
                report.skipped += 1;
                continue;
            };

            info!(
                subsystem = "jobs",
                component = "topic_generation",
                { logging::DOC_ID } = %doc.id,
                title = doc.title.as_deref().unwrap_or_default(),
                "Generating topics"
            );

            let extraction = match self.modeler.apply(&text).await {
                Ok(extraction) => extraction,
                Err(e) => {
                    self.save(store.as_ref()).await?;
                    triage(
                        e,
                        self.modeler.config().transient_policy,
                        "topic_modeling",
                        &doc.id,
                    )?;
                    report.failed += 1;
                    continue;
                }
            };
            report.processed += 1;

            if self.config.update_index {
                let patch = DocumentPatch::topics(&extraction.primary, &extraction.secondary);
                match self
                    .index
                    .update_document(doc.index_or(default_index), &doc.id, &patch)
                    .await
                {
                    Ok(()) => report.updated += 1,
                    Err(e) => {
                        self.save(store.as_ref()).await?;
                        triage(
                            e,
                            self.modeler.config().transient_policy,
                            "update_document",
                            &doc.id,
                        )?;
                        report.failed += 1;
                    }
                }
            }

            if let Some(store) = store.as_mut() {
                store.insert(TopicRow {
                    primary_topics: extraction.primary,
                    secondary_topics: extraction.secondary,
                    source_id: source_id.to_string(),
                });
            }
            if self.config.save_every > 0 && report.processed % self.config.save_every == 0 {
                self.save(store.as_ref()).await?;
            }
        }

        self.save(store.as_ref()).await?;
        ctx.report_progress(total, total, Some("done"));
        Ok(report)
    }
}
