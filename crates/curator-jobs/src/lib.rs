//! # curator-jobs
//!
//! Batch jobs that keep the document index tidy.
//!
//! This crate provides:
//! - Duplicate cleanup per domain
//! - Topic generation with CSV checkpoints, and pushing saved topics
//! - Verbatim topic tagging from a vocabulary
//! - Summary embeddings for semantic search
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use curator_index::ElasticsearchClient;
//! use curator_jobs::{DuplicateCleanupJob, JobRunner};
//!
//! let index = Arc::new(ElasticsearchClient::from_env()?);
//! let summary = JobRunner::for_domains(&["https://btctranscripts.com/"])
//!     .run(&DuplicateCleanupJob::new(index))
//!     .await?;
//! println!("deleted {}", summary.total.deleted);
//! ```

pub mod handler;
pub mod handlers;
pub mod runner;
pub mod topic_store;

// Re-export core types
pub use curator_core::*;

pub use handler::{domain_slug, JobContext, JobHandler, JobKind, JobReport, ProgressCallback};
pub use handlers::{
    topic_text, DuplicateCleanupJob, EmbeddingJob, EmbeddingJobConfig, PushTopicsJob,
    TopicGenerationConfig, TopicGenerationJob, TopicTaggingJob,
};
pub use runner::{DomainOutcome, JobRunner, RunSummary};
pub use topic_store::{load_topic_list, merge_csv_dir, TopicCsvStore, TopicRow};
