//! Test helpers for job tests.
//!
//! Provides an in-memory index and fake inference backends.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use curator_core::{
    DocumentPatch, DocumentQuery, DocumentRecord, EmbeddingBackend, Error, GenerationBackend,
    Result, SearchIndex, SimilarDocument, Tokenizer, Vector,
};
use serde_json::Value as JsonValue;

pub const INDEX: &str = "test-index";

/// How a scripted index call should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Skips the document.
    Skip,
    /// Transient, retryable failure.
    Transient,
    /// Ends the run.
    Fatal,
}

impl Failure {
    fn error(self, id: &str) -> Error {
        match self {
            Failure::Skip => Error::Index(format!("document {} rejected", id)),
            Failure::Transient => Error::ServiceUnavailable("index overloaded".into()),
            Failure::Fatal => Error::Unauthorized("bad credentials".into()),
        }
    }
}

/// Index held in memory. Applies updates to its documents and records every call.
#[derive(Default)]
pub struct MemoryIndex {
    docs: Mutex<Vec<DocumentRecord>>,
    extra_fields: Mutex<HashMap<String, serde_json::Map<String, JsonValue>>>,
    pub queries: Mutex<Vec<DocumentQuery>>,
    pub updates: Mutex<Vec<(String, String, DocumentPatch)>>,
    pub deletes: Mutex<Vec<(String, String)>>,
    pub mappings: Mutex<Vec<(String, usize)>>,
    failures: Mutex<HashMap<String, Failure>>,
}

impl MemoryIndex {
    pub fn with_docs(docs: Vec<DocumentRecord>) -> Self {
        Self {
            docs: Mutex::new(docs),
            ..Default::default()
        }
    }

    /// Make writes to `id` fail.
    pub fn fail_writes(&self, id: &str, failure: Failure) {
        self.failures.lock().unwrap().insert(id.to_string(), failure);
    }

    pub fn doc(&self, id: &str) -> Option<DocumentRecord> {
        self.docs.lock().unwrap().iter().find(|d| d.id == id).cloned()
    }

    pub fn field(&self, id: &str, field: &str) -> Option<JsonValue> {
        self.extra_fields
            .lock()
            .unwrap()
            .get(id)
            .and_then(|fields| fields.get(field).cloned())
    }

    pub fn updated_ids(&self) -> Vec<String> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .map(|(_, id, _)| id.clone())
            .collect()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deletes
            .lock()
            .unwrap()
            .iter()
            .map(|(_, id)| id.clone())
            .collect()
    }

    fn check_failure(&self, id: &str) -> Result<()> {
        match self.failures.lock().unwrap().get(id) {
            Some(failure) => Err(failure.error(id)),
            None => Ok(()),
        }
    }

    fn matches(&self, doc: &DocumentRecord, query: &DocumentQuery) -> bool {
        if !query.domains.is_empty()
            && !doc
                .domain
                .as_deref()
                .is_some_and(|d| query.domains.iter().any(|q| q == d))
        {
            return false;
        }
        for field in &query.missing_fields {
            let present = match field.as_str() {
                "primary_topics" => !doc.primary_topics.is_empty(),
                "secondary_topics" => !doc.secondary_topics.is_empty(),
                other => self.field(&doc.id, other).is_some(),
            };
            if present {
                return false;
            }
        }
        if let Some(phrase) = &query.phrase {
            let phrase = phrase.to_lowercase();
            let contains = |text: &Option<String>| {
                text.as_deref()
                    .is_some_and(|t| t.to_lowercase().contains(&phrase))
            };
            if !(contains(&doc.summary) && contains(&doc.body)) {
                return false;
            }
        }
        true
    }
}

fn string_list(value: &JsonValue) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn fetch_documents(&self, query: &DocumentQuery) -> Result<Vec<DocumentRecord>> {
        self.queries.lock().unwrap().push(query.clone());
        let docs = self.docs.lock().unwrap().clone();
        Ok(docs.into_iter().filter(|d| self.matches(d, query)).collect())
    }

    async fn update_document(&self, index: &str, id: &str, patch: &DocumentPatch) -> Result<()> {
        self.check_failure(id)?;
        self.updates
            .lock()
            .unwrap()
            .push((index.to_string(), id.to_string(), patch.clone()));

        let mut docs = self.docs.lock().unwrap();
        let Some(doc) = docs.iter_mut().find(|d| d.id == id) else {
            if patch.upsert {
                return Ok(());
            }
            return Err(Error::NotFound(format!("document {}", id)));
        };
        for (field, value) in &patch.fields {
            match field.as_str() {
                "primary_topics" => doc.primary_topics = string_list(value),
                "secondary_topics" => doc.secondary_topics = string_list(value),
                _ => {
                    self.extra_fields
                        .lock()
                        .unwrap()
                        .entry(id.to_string())
                        .or_default()
                        .insert(field.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<()> {
        self.check_failure(id)?;
        self.deletes
            .lock()
            .unwrap()
            .push((index.to_string(), id.to_string()));
        self.docs.lock().unwrap().retain(|d| d.id != id);
        Ok(())
    }

    async fn count_documents(&self, _domain: Option<&str>) -> Result<u64> {
        Ok(self.docs.lock().unwrap().len() as u64)
    }

    async fn add_vector_field(&self, field: &str, dimension: usize) -> Result<()> {
        self.mappings
            .lock()
            .unwrap()
            .push((field.to_string(), dimension));
        Ok(())
    }

    async fn similar_documents(
        &self,
        _field: &str,
        _vector: &[f32],
        _top_k: usize,
    ) -> Result<Vec<SimilarDocument>> {
        Ok(Vec::new())
    }

    fn index_name(&self) -> &str {
        INDEX
    }
}

/// Embeds every text as the same fixed vector, or fails with scripted errors first.
pub struct FixedEmbedder {
    pub vector: Vector,
    failures: Mutex<VecDeque<Failure>>,
    pub calls: Mutex<Vec<String>>,
}

impl FixedEmbedder {
    pub fn new(vector: Vector) -> Self {
        Self {
            vector,
            failures: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_first(self, failures: Vec<Failure>) -> Self {
        *self.failures.lock().unwrap() = failures.into();
        self
    }
}

#[async_trait]
impl EmbeddingBackend for FixedEmbedder {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        self.calls.lock().unwrap().extend(texts.iter().cloned());
        if let Some(failure) = self.failures.lock().unwrap().pop_front() {
            return Err(match failure {
                Failure::Skip => Error::InvalidRequest("input too long".into()),
                Failure::Transient => Error::ServiceUnavailable("502".into()),
                Failure::Fatal => Error::RateLimited("quota".into()),
            });
        }
        Ok(texts.iter().map(|_| self.vector.clone()).collect())
    }

    fn dimension(&self) -> usize {
        self.vector.len()
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

/// Answers every prompt with the same reply.
pub struct CannedGenerator {
    reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl CannedGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationBackend for CannedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    async fn generate_with_system(&self, _system: &str, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> &str {
        "canned"
    }
}

/// One token per character, so short documents always fit in one chunk.
pub struct CharTokenizer;

impl Tokenizer for CharTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        text.chars().count()
    }

    fn encode(&self, text: &str) -> Vec<u32> {
        text.chars().map(u32::from).collect()
    }

    fn decode(&self, tokens: &[u32]) -> String {
        tokens.iter().filter_map(|&t| char::from_u32(t)).collect()
    }

    fn name(&self) -> &str {
        "chars"
    }
}

/// A document that carries every grouping field.
pub fn record(id: &str, domain: &str, title: &str, url: &str) -> DocumentRecord {
    DocumentRecord {
        index_name: Some(INDEX.to_string()),
        source_id: Some(format!("src-{}", id)),
        title: Some(title.to_string()),
        created_at: Some("2024-03-05".to_string()),
        transcript_by: Some("bot".to_string()),
        domain: Some(domain.to_string()),
        body_type: Some("markdown".to_string()),
        url: Some(url.to_string()),
        ..DocumentRecord::new(id)
    }
}
