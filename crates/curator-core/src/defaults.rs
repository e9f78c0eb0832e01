//! Centralized default constants for the curator pipelines.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// SEARCH INDEX
// =============================================================================

/// Documents fetched per scroll page.
pub const ES_DATA_FETCH_SIZE: usize = 10_000;

/// Scroll context keep-alive.
pub const ES_SCROLL_KEEP_ALIVE: &str = "5m";

/// Request timeout for index calls, in seconds.
pub const ES_TIMEOUT_SECS: u64 = 120;

/// Field holding the summary embedding vector.
pub const VECTOR_FIELD: &str = "summary_vector_embeddings";

/// Field queried by the similarity search.
pub const SIMILARITY_FIELD: &str = "summary_vector";

/// Dimension of the dense vector mapping.
pub const VECTOR_DIMENSION: usize = 1024;

/// Number of matches returned by a similarity query.
pub const SIMILARITY_TOP_K: usize = 3;

// =============================================================================
// TOPIC MODELING
// =============================================================================

/// Tokens per chunk sent to the completion model.
pub const CHUNK_TOKENS: usize = 2100;

/// Encoding used to count and split tokens.
pub const TOKENIZER_ENCODING: &str = "cl100k_base";

/// Default chat completion model.
pub const CHAT_COMPLETION_MODEL: &str = "gpt-3.5-turbo";

/// Pause before each completion call, in milliseconds.
pub const COMPLETION_DELAY_MS: u64 = 2_000;

/// Completion length cap.
pub const COMPLETION_MAX_TOKENS: u32 = 300;

/// Pause after each CSV save, in milliseconds.
pub const SAVE_DELAY_MS: u64 = 3_000;

/// Save the CSV store after every N processed documents.
pub const SAVE_EVERY: usize = 50;

/// Directory for generated topic CSV files.
pub const OUTPUT_DIR: &str = "gpt_output";

/// Controlled vocabulary file.
pub const TOPICS_CSV: &str = "btc_topics.csv";

/// Column holding the vocabulary in the topics file.
pub const TOPICS_COLUMN: &str = "Topics";

/// Days covered by `--last-days` when no value is given.
pub const DATE_RANGE_DAYS: i64 = 7;

// =============================================================================
// DEDUPLICATION
// =============================================================================

/// Base URL whose duplicates must carry a dated path.
pub const DATED_URL_BASE: &str = "https://btctranscripts.com/bitcoin-core-dev-tech/";

/// Pattern a URL under [`DATED_URL_BASE`] must match to be kept.
pub const DATED_URL_PATTERN: &str =
    "^https://btctranscripts.com/bitcoin-core-dev-tech/[0-9]{4}-[0-9]{2}/.*";

// =============================================================================
// RETRY
// =============================================================================

/// Attempts per external call, including the first.
pub const RETRY_MAX_ATTEMPTS: u32 = 4;

/// First retry delay, in milliseconds.
pub const RETRY_INITIAL_BACKOFF_MS: u64 = 2_000;

/// Longest single retry delay, in milliseconds.
pub const RETRY_MAX_BACKOFF_MS: u64 = 30_000;

// =============================================================================
// DOMAINS
// =============================================================================

/// Mailing lists and forums processed by the topic and embedding jobs.
pub const TOPIC_DOMAINS: &[&str] = &[
    "https://lists.linuxfoundation.org/pipermail/lightning-dev/",
    "https://lists.linuxfoundation.org/pipermail/bitcoin-dev/",
    "https://delvingbitcoin.org/",
    "https://gnusha.org/pi/bitcoindev/",
];

/// Lists whose stored topic CSVs are pushed back to the index.
pub const PUSH_DOMAINS: &[&str] = &[
    "https://lists.linuxfoundation.org/pipermail/lightning-dev/",
    "https://lists.linuxfoundation.org/pipermail/bitcoin-dev/",
];

/// Sources cleaned by the duplicate resolver.
pub const DEDUP_DOMAINS: &[&str] = &["https://btctranscripts.com/"];
