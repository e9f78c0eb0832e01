//! Structured logging schema and field name constants for curator.
//!
//! All crates use these constants for consistent structured logging fields,
//! either as `{ logging::FIELD } = value` in event macros or by writing the
//! same literal name.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Unit of work failed, or the run is aborting |
//! | WARN  | Recoverable issue, repair or fallback applied (model hallucination, skipped record) |
//! | INFO  | Lifecycle events, per-domain and per-document progress |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (hits, chunks) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "index", "search", "inference", "jobs", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "elasticsearch", "deduplication", "keywords", "runner"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "fetch_documents", "generate", "resolve_duplicates"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Index `_id` of the document being operated on.
pub const DOC_ID: &str = "doc_id";

/// Client-assigned `source_id` of the document.
pub const SOURCE_ID: &str = "source_id";

/// Domain URL a job is processing.
pub const DOMAIN: &str = "domain";

/// Job kind being run.
pub const JOB_KIND: &str = "job_kind";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of documents returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Number of chunks a document was split into.
pub const CHUNK_COUNT: &str = "chunk_count";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Attempt number of a retried call (1-based).
pub const ATTEMPT: &str = "attempt";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
