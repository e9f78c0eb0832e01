//! Tag documents whose text mentions a vocabulary topic verbatim.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use curator_core::{
    logging, DocumentPatch, DocumentQuery, Result, SearchIndex, TopicList, TransientPolicy,
};

use crate::handler::{JobContext, JobHandler, JobKind, JobReport};
use crate::handlers::triage;

/// Appends each topic to `primary_topics` of documents that contain it.
pub struct TopicTaggingJob {
    index: Arc<dyn SearchIndex>,
    topics: TopicList,
    transient_policy: TransientPolicy,
}

impl TopicTaggingJob {
    pub fn new(index: Arc<dyn SearchIndex>, topics: TopicList) -> Self {
        Self {
            index,
            topics,
            transient_policy: TransientPolicy::default(),
        }
    }

    pub fn with_transient_policy(mut self, policy: TransientPolicy) -> Self {
        self.transient_policy = policy;
        self
    }
}

/// `existing` with `topic` appended, or `None` if it is already there.
fn with_topic(existing: &[String], topic: &str) -> Option<Vec<String>> {
    if existing.iter().any(|t| t == topic) {
        return None;
    }
    let mut topics = existing.to_vec();
    topics.push(topic.to_string());
    Some(topics)
}

#[async_trait]
impl JobHandler for TopicTaggingJob {
    fn kind(&self) -> JobKind {
        JobKind::TopicTagging
    }

    async fn execute(&self, ctx: &JobContext) -> Result<JobReport> {
        let mut report = JobReport::default();
        let default_index = self.index.index_name();
        let total = self.topics.len();

        for (i, topic) in self.topics.iter().enumerate() {
            ctx.report_progress(i, total, Some(topic.as_str()));
            let query = DocumentQuery::for_domain(ctx.domain())
                .with_date_range(ctx.date_range)
                .with_phrase(topic.as_str());
            let docs = self.index.fetch_documents(&query).await?;
            report.fetched += docs.len();
            info!(
                subsystem = "jobs",
                component = "topic_tagging",
                topic = %topic,
                { logging::RESULT_COUNT } = docs.len(),
                "Documents mentioning topic"
            );

            for doc in &docs {
                let Some(primary) = with_topic(&doc.primary_topics, topic) else {
                    report.skipped += 1;
                    continue;
                };
                report.processed += 1;

                let patch = DocumentPatch::new().set("primary_topics", primary);
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
        }

        ctx.report_progress(total, total, Some("done"));
        Ok(report)
    }
}
