//! Data model shared by the index client, the core algorithms, and the jobs.

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Embedding vector.
pub type Vector = Vec<f32>;

// =============================================================================
// DOCUMENTS
// =============================================================================

/// A document as fetched from the search index.
///
/// Optional string fields are trimmed on construction by the index client;
/// a field that is missing or null in the index is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Index-internal identifier (`_id`). Always present, unique per record.
    pub id: String,
    /// Index the hit came from (`_index`).
    pub index_name: Option<String>,
    /// Client-assigned logical identifier; repeats across re-ingested copies.
    pub source_id: Option<String>,
    pub title: Option<String>,
    pub created_at: Option<String>,
    pub transcript_by: Option<String>,
    pub domain: Option<String>,
    pub body_type: Option<String>,
    pub url: Option<String>,
    pub body: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub primary_topics: Vec<String>,
    #[serde(default)]
    pub secondary_topics: Vec<String>,
}

impl DocumentRecord {
    /// Create a record with only its identifier set.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Composite key used to cluster candidate duplicates.
    ///
    /// Returns the name of the first missing field when the key cannot be built.
    pub fn grouping_key(&self) -> Result<GroupingKey, &'static str> {
        fn field<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, &'static str> {
            value.as_deref().ok_or(name)
        }

        Ok(GroupingKey {
            index_name: field(&self.index_name, "index_name")?.to_string(),
            title: field(&self.title, "title")?.to_string(),
            transcript_by: field(&self.transcript_by, "transcript_by")?.to_string(),
            created_at: field(&self.created_at, "created_at")?.to_string(),
            domain: field(&self.domain, "domain")?.to_string(),
            body_type: field(&self.body_type, "body_type")?.to_string(),
        })
    }

    /// Summary when present and non-empty.
    pub fn non_empty_summary(&self) -> Option<&str> {
        self.summary.as_deref().filter(|s| !s.is_empty())
    }

    /// Index to address updates to, falling back to `default_index`.
    pub fn index_or<'a>(&'a self, default_index: &'a str) -> &'a str {
        self.index_name.as_deref().unwrap_or(default_index)
    }
}

/// Candidate-duplicate key: two records with equal keys describe the same
/// logical document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupingKey {
    pub index_name: String,
    pub title: String,
    pub transcript_by: String,
    pub created_at: String,
    pub domain: String,
    pub body_type: String,
}

// =============================================================================
// QUERIES AND PATCHES
// =============================================================================

/// Inclusive range of calendar days on `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Today and the `days` previous days (UTC).
    pub fn last_days(days: i64) -> Self {
        let end = Utc::now().date_naive();
        Self {
            start: end - Duration::days(days),
            end,
        }
    }

    /// Lower bound as an index timestamp (`YYYY-MM-DDT00:00:00.000Z`).
    pub fn start_timestamp(&self) -> String {
        format!("{}T00:00:00.000Z", self.start.format("%Y-%m-%d"))
    }

    /// Upper bound as an index timestamp (`YYYY-MM-DDT23:59:59.999Z`).
    pub fn end_timestamp(&self) -> String {
        format!("{}T23:59:59.999Z", self.end.format("%Y-%m-%d"))
    }
}

/// Filter for fetching documents from the index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentQuery {
    /// Domain URLs to match; empty means every domain.
    pub domains: Vec<String>,
    /// Restrict `created_at` to this range.
    pub date_range: Option<DateRange>,
    /// Fields that must be absent from matching documents.
    pub missing_fields: Vec<String>,
    /// Phrase that must appear in both summary and body.
    pub phrase: Option<String>,
}

impl DocumentQuery {
    /// Match every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Match documents of one domain, or every domain when `None`.
    pub fn for_domain(domain: Option<&str>) -> Self {
        Self {
            domains: domain.map(|d| vec![d.to_string()]).unwrap_or_default(),
            ..Default::default()
        }
    }

    pub fn with_date_range(mut self, range: Option<DateRange>) -> Self {
        self.date_range = range;
        self
    }

    pub fn missing(mut self, field: impl Into<String>) -> Self {
        self.missing_fields.push(field.into());
        self
    }

    pub fn with_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.phrase = Some(phrase.into());
        self
    }
}

/// Partial-field update applied by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    pub fields: Map<String, JsonValue>,
    /// Create the document when it does not exist.
    pub upsert: bool,
}

impl DocumentPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one field.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn with_upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    /// Patch writing both topic fields.
    pub fn topics(primary: &[String], secondary: &[String]) -> Self {
        Self::new()
            .set("primary_topics", primary.to_vec())
            .set("secondary_topics", secondary.to_vec())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// =============================================================================
// TOPICS
// =============================================================================

/// Controlled vocabulary of topics, immutable for the duration of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicList {
    topics: Vec<String>,
}

impl TopicList {
    pub fn new(topics: Vec<String>) -> Self {
        Self { topics }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.topics
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.topics.iter()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

impl From<Vec<String>> for TopicList {
    fn from(topics: Vec<String>) -> Self {
        Self::new(topics)
    }
}

/// Keywords extracted for one document, split against the vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordExtraction {
    /// Keywords matching a vocabulary entry after normalization.
    pub primary: Vec<String>,
    /// Everything else.
    pub secondary: Vec<String>,
}

impl KeywordExtraction {
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }
}

// =============================================================================
// SIMILARITY
// =============================================================================

/// One match of a vector similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarDocument {
    pub title: Option<String>,
    /// Summary, or the body when the document has no summary.
    pub summary: Option<String>,
    pub score: Option<f64>,
}

/// Question and its closest documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResponse {
    pub question: String,
    pub matches: Vec<SimilarDocument>,
}
