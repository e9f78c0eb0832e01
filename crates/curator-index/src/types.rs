//! Elasticsearch response types and their conversion into curator models.

use curator_core::{DocumentRecord, SimilarDocument};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

// =============================================================================
// SEARCH RESPONSES
// =============================================================================

/// Response of `_search` and `_search/scroll`.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "_scroll_id")]
    pub scroll_id: Option<String>,
    pub hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct HitsEnvelope {
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// One search hit.
#[derive(Debug, Deserialize)]
pub struct Hit {
    #[serde(rename = "_index")]
    pub index: Option<String>,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score")]
    pub score: Option<f64>,
    #[serde(rename = "_source", default)]
    pub source: Map<String, JsonValue>,
}

impl Hit {
    /// Scalar `_source` field as a trimmed string; null, missing, and
    /// structured values are absent.
    fn text(&self, field: &str) -> Option<String> {
        match self.source.get(field)? {
            JsonValue::String(s) => Some(s.trim().to_string()),
            JsonValue::Number(n) => Some(n.to_string()),
            JsonValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn string_list(&self, field: &str) -> Vec<String> {
        match self.source.get(field) {
            Some(JsonValue::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Convert into a [`DocumentRecord`].
    pub fn into_record(self) -> DocumentRecord {
        DocumentRecord {
            index_name: self.index.as_deref().map(|i| i.trim().to_string()),
            source_id: self.text("id"),
            title: self.text("title"),
            created_at: self.text("created_at"),
            transcript_by: self.text("transcript_by"),
            domain: self.text("domain"),
            body_type: self.text("body_type"),
            url: self.text("url"),
            body: self.text("body"),
            summary: self.text("summary"),
            primary_topics: self.string_list("primary_topics"),
            secondary_topics: self.string_list("secondary_topics"),
            id: self.id.trim().to_string(),
        }
    }

    /// Convert into a similarity match; the summary falls back to the body.
    pub fn into_similar(self) -> SimilarDocument {
        let summary = self
            .text("summary")
            .filter(|s| !s.is_empty())
            .or_else(|| self.text("body"));
        SimilarDocument {
            title: self.text("title"),
            summary,
            score: self.score,
        }
    }
}

/// Response of `_count`.
#[derive(Debug, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

// =============================================================================
// ERROR RESPONSES
// =============================================================================

/// Error body returned by Elasticsearch on a failed request.
#[derive(Debug, Deserialize)]
pub struct ElasticErrorResponse {
    pub error: JsonValue,
}

impl ElasticErrorResponse {
    /// Human-readable reason, whether `error` is a string or an object.
    pub fn reason(&self) -> String {
        match &self.error {
            JsonValue::String(s) => s.clone(),
            JsonValue::Object(obj) => obj
                .get("reason")
                .and_then(JsonValue::as_str)
                .or_else(|| obj.get("type").and_then(JsonValue::as_str))
                .unwrap_or("unknown error")
                .to_string(),
            other => other.to_string(),
        }
    }
}
