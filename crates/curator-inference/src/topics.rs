//! Topic modeling: chunk a document, ask the model for vocabulary keywords
//! per chunk, and split the accumulated keywords against the vocabulary.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use curator_core::{
    chunk_text, defaults, format_string_list, logging, ErrorClass, GenerationBackend,
    KeywordExtraction, Result, RetryPolicy, Tokenizer, TopicList, TransientPolicy,
};

use crate::keywords::{
    clean_model_response, normalize_keywords, partition_keywords, KeywordAccumulator,
    KeywordOutcome,
};

/// System message sent with every classification prompt.
pub const SYSTEM_MESSAGE: &str = "You are an AI assistant tasked with classifying content into specific topics. Your function is to extract relevant keywords from a given text, based on a predefined list of topics. Remember, the keywords you identify should only be ones that appear in the provided topic list.";

/// Settings for a [`TopicModeler`].
#[derive(Debug, Clone)]
pub struct TopicModelingConfig {
    /// Tokens per chunk.
    pub chunk_tokens: usize,
    /// Pause before each completion call.
    pub request_delay: Duration,
    /// Retry policy around each completion call.
    pub retry: RetryPolicy,
    /// What to do when a chunk keeps failing transiently.
    pub transient_policy: TransientPolicy,
}

impl Default for TopicModelingConfig {
    fn default() -> Self {
        Self {
            chunk_tokens: defaults::CHUNK_TOKENS,
            request_delay: Duration::from_millis(defaults::COMPLETION_DELAY_MS),
            retry: RetryPolicy::default(),
            transient_policy: TransientPolicy::default(),
        }
    }
}

impl TopicModelingConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `TOPIC_CHUNK_TOKENS` | `2100` | Tokens per chunk |
    /// | `TOPIC_REQUEST_DELAY_MS` | `2000` | Pause before each completion |
    /// | `TRANSIENT_POLICY` | `continue` | `continue` or `abort` after exhausted retries |
    ///
    /// Retry settings come from [`RetryPolicy::from_env`].
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            chunk_tokens: std::env::var("TOPIC_CHUNK_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(base.chunk_tokens),
            request_delay: std::env::var("TOPIC_REQUEST_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(base.request_delay),
            retry: RetryPolicy::from_env(),
            transient_policy: TransientPolicy::from_env(),
        }
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_chunk_tokens(mut self, tokens: usize) -> Self {
        self.chunk_tokens = tokens;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_transient_policy(mut self, policy: TransientPolicy) -> Self {
        self.transient_policy = policy;
        self
    }
}

/// Extracts vocabulary keywords from documents with a generation backend.
pub struct TopicModeler {
    backend: Arc<dyn GenerationBackend>,
    tokenizer: Arc<dyn Tokenizer>,
    topics: TopicList,
    topic_literal: String,
    config: TopicModelingConfig,
}

impl TopicModeler {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        tokenizer: Arc<dyn Tokenizer>,
        topics: TopicList,
        config: TopicModelingConfig,
    ) -> Self {
        let topic_literal = format_string_list(topics.as_slice());
        Self {
            backend,
            tokenizer,
            topics,
            topic_literal,
            config,
        }
    }

    pub fn topics(&self) -> &TopicList {
        &self.topics
    }

    pub fn config(&self) -> &TopicModelingConfig {
        &self.config
    }

    /// Classification prompt for one chunk.
    pub fn build_prompt(&self, chunk: &str) -> String {
        format!(
            "Analyze the following content and extract the relevant keywords from the provided TOPIC_LIST.\n\
             The keywords should only be selected from the given TOPIC_LIST and match the content of the text.\n\
             TOPIC_LIST = {topics} \n\n\
             CONTENT: {chunk}\n\n\
             Based on these guidelines:\n\
             1. Only keywords from the TOPIC_LIST should be used.\n\
             2. Output should be a Python list of relevant keywords from the TOPIC_LIST that describe the CONTENT.\n\
             3. If the provided CONTENT does not contain any relevant keywords from the given TOPIC_LIST output an empty Python List ie., [].\n\n\
             Please provide the list of relevant topics.\n\
             The relevant topics extracted from the provided content are: ",
            topics = self.topic_literal,
            chunk = chunk,
        )
    }

    /// Ask the model about one chunk and normalize its answer.
    pub async fn keywords_for_chunk(&self, chunk: &str) -> Result<KeywordOutcome> {
        if !self.config.request_delay.is_zero() {
            tokio::time::sleep(self.config.request_delay).await;
        }

        let prompt = self.build_prompt(chunk);
        let raw = self
            .config
            .retry
            .run("openai.chat_completion", || {
                self.backend.generate_with_system(SYSTEM_MESSAGE, &prompt)
            })
            .await?;

        let cleaned = clean_model_response(&raw);
        debug!(
            subsystem = "inference",
            component = "topics",
            response = %cleaned,
            "Model response"
        );
        Ok(normalize_keywords(&cleaned))
    }

    /// Keywords of every chunk, deduplicated in first-seen order.
    ///
    /// Fatal errors abort with the error. Skip-unit errors drop the chunk.
    /// Transient errors that outlive the retry policy drop the chunk or abort
    /// depending on the configured [`TransientPolicy`].
    pub async fn extract_keywords(&self, chunks: &[String]) -> Result<Vec<String>> {
        let mut accumulator = KeywordAccumulator::new();

        for (i, chunk) in chunks.iter().enumerate() {
            match self.keywords_for_chunk(chunk).await {
                Ok(KeywordOutcome::Parsed(keywords)) => {
                    debug!(
                        subsystem = "inference",
                        component = "topics",
                        chunk = i,
                        keywords = ?keywords,
                        "Chunk keywords"
                    );
                    accumulator.extend(keywords);
                }
                Ok(KeywordOutcome::Skip(reason)) => {
                    debug!(
                        subsystem = "inference",
                        component = "topics",
                        chunk = i,
                        %reason,
                        "Chunk contributed no keywords"
                    );
                }
                Err(e) => match e.class() {
                    ErrorClass::Fatal => {
                        error!(
                            subsystem = "inference",
                            component = "topics",
                            chunk = i,
                            { logging::ERROR_MSG } = %e,
                            "Fatal model error, aborting"
                        );
                        return Err(e);
                    }
                    ErrorClass::SkipUnit => {
                        error!(
                            subsystem = "inference",
                            component = "topics",
                            chunk = i,
                            { logging::ERROR_MSG } = %e,
                            "Model rejected chunk, skipping"
                        );
                    }
                    ErrorClass::Retryable => {
                        error!(
                            subsystem = "inference",
                            component = "topics",
                            chunk = i,
                            { logging::ERROR_MSG } = %e,
                            "Model unavailable after retries"
                        );
                        if self.config.transient_policy == TransientPolicy::Abort {
                            return Err(e);
                        }
                    }
                },
            }
        }

        Ok(accumulator.into_keywords())
    }

    /// Chunk `text`, extract keywords, and split them against the vocabulary.
    pub async fn apply(&self, text: &str) -> Result<KeywordExtraction> {
        let chunks = chunk_text(self.tokenizer.as_ref(), text, self.config.chunk_tokens);
        debug!(
            subsystem = "inference",
            component = "topics",
            { logging::CHUNK_COUNT } = chunks.len(),
            "Text chunked"
        );
        if chunks.is_empty() {
            warn!(
                subsystem = "inference",
                component = "topics",
                "Nothing to classify, text is empty"
            );
            return Ok(KeywordExtraction::default());
        }

        let keywords = self.extract_keywords(&chunks).await?;
        let extraction = partition_keywords(&keywords, &self.topics);
        info!(
            subsystem = "inference",
            component = "topics",
            { logging::CHUNK_COUNT } = chunks.len(),
            primary = extraction.primary.len(),
            secondary = extraction.secondary.len(),
            "Keywords extracted"
        );
        Ok(extraction)
    }
}
