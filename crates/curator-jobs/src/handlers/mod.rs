//! Job handlers, one per batch pipeline.

mod dedup;
mod embedding;
mod push_topics;
mod topic_generation;
mod topic_tagging;

pub use dedup::DuplicateCleanupJob;
pub use embedding::{EmbeddingJob, EmbeddingJobConfig};
pub use push_topics::PushTopicsJob;
pub use topic_generation::{topic_text, TopicGenerationConfig, TopicGenerationJob};
pub use topic_tagging::TopicTaggingJob;

use tracing::error;

use curator_core::{logging, Error, ErrorClass, TransientPolicy};

/// Decide whether a per-document failure ends the run.
///
/// Returns the error when the run must stop: fatal errors always, transient
/// errors when the policy is [`TransientPolicy::Abort`]. Otherwise the failure
/// is logged and `Ok(())` lets the caller move to the next document.
pub(crate) fn triage(
    error: Error,
    policy: TransientPolicy,
    op: &str,
    doc_id: &str,
) -> Result<(), Error> {
    let abort = match error.class() {
        ErrorClass::Fatal => true,
        ErrorClass::Retryable => policy == TransientPolicy::Abort,
        ErrorClass::SkipUnit => false,
    };

    if abort {
        error!(
            subsystem = "jobs",
            { logging::OPERATION } = op,
            { logging::DOC_ID } = doc_id,
            { logging::ERROR_MSG } = %error,
            "Aborting on document failure"
        );
        Err(error)
    } else {
        error!(
            subsystem = "jobs",
            { logging::OPERATION } = op,
            { logging::DOC_ID } = doc_id,
            { logging::ERROR_MSG } = %error,
            "Document failed, continuing"
        );
        Ok(())
    }
}
