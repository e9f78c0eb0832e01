//! Job handler trait and the context passed to each run.

use std::fmt;

use async_trait::async_trait;

use curator_core::{DateRange, Result};

/// Progress callback type for job handlers: `(done, total, message)`.
pub type ProgressCallback = Box<dyn Fn(usize, usize, Option<&str>) + Send + Sync>;

/// Batch job kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    DuplicateCleanup,
    TopicGeneration,
    PushTopics,
    TopicTagging,
    Embedding,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::DuplicateCleanup => "duplicate_cleanup",
            JobKind::TopicGeneration => "topic_generation",
            JobKind::PushTopics => "push_topics",
            JobKind::TopicTagging => "topic_tagging",
            JobKind::Embedding => "embedding",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context provided to job handlers.
pub struct JobContext {
    /// Domain URL to process, or `None` for every document in the index.
    pub domain: Option<String>,
    /// Restrict fetched documents to this `created_at` range.
    pub date_range: Option<DateRange>,
    progress_callback: Option<ProgressCallback>,
}

impl JobContext {
    /// Create a context for one domain (`None` means all data).
    pub fn new(domain: Option<&str>) -> Self {
        Self {
            domain: domain.map(str::to_string),
            date_range: None,
            progress_callback: None,
        }
    }

    pub fn with_date_range(mut self, range: Option<DateRange>) -> Self {
        self.date_range = range;
        self
    }

    /// Set the progress callback.
    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize, Option<&str>) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    /// Report progress to the callback.
    pub fn report_progress(&self, done: usize, total: usize, message: Option<&str>) {
        if let Some(ref callback) = self.progress_callback {
            callback(done, total, message);
        }
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Short name of the domain used in file names.
    pub fn slug(&self) -> String {
        domain_slug(self.domain())
    }

    /// Label used in logs.
    pub fn label(&self) -> &str {
        self.domain().unwrap_or("all_data")
    }
}

/// Second-to-last `/` segment of a domain URL, or `all_data` for no domain.
///
/// `https://lists.linuxfoundation.org/pipermail/bitcoin-dev/` becomes
/// `bitcoin-dev`, `https://delvingbitcoin.org/` becomes `delvingbitcoin.org`.
pub fn domain_slug(domain: Option<&str>) -> String {
    let Some(domain) = domain else {
        return "all_data".to_string();
    };
    let segments: Vec<&str> = domain.split('/').collect();
    if segments.len() >= 2 {
        segments[segments.len() - 2].to_string()
    } else {
        domain.to_string()
    }
}

/// Counters reported by a finished job run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    /// Documents returned by the index query.
    pub fetched: usize,
    /// Documents a decision was made for.
    pub processed: usize,
    /// Documents written back to the index.
    pub updated: usize,
    /// Documents deleted from the index.
    pub deleted: usize,
    /// Documents passed over (already done, missing fields, no stored row).
    pub skipped: usize,
    /// Documents whose unit of work failed.
    pub failed: usize,
}

impl JobReport {
    /// Add another report's counters to this one.
    pub fn merge(&mut self, other: &JobReport) {
        self.fetched += other.fetched;
        self.processed += other.processed;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Trait for job handlers.
///
/// Returning an error ends the run for the current domain; the runner aborts
/// entirely when the error is fatal.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// The job kind this handler runs.
    fn kind(&self) -> JobKind;

    /// Execute the job for one domain.
    async fn execute(&self, ctx: &JobContext) -> Result<JobReport>;
}
