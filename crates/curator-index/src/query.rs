//! Request bodies for the Elasticsearch REST API.

use curator_core::DocumentQuery;
use serde_json::{json, Value as JsonValue};

/// `term` for one domain, `terms` for several.
pub fn domain_clause(domains: &[String]) -> Option<JsonValue> {
    match domains {
        [] => None,
        [domain] => Some(json!({ "term": { "domain.keyword": domain } })),
        many => Some(json!({ "terms": { "domain.keyword": many } })),
    }
}

/// Search body for a [`DocumentQuery`]; `size` is the scroll page size.
pub fn search_body(query: &DocumentQuery, size: usize) -> JsonValue {
    let mut must = Vec::new();

    if let Some(range) = &query.date_range {
        must.push(json!({
            "range": {
                "created_at": {
                    "gte": range.start_timestamp(),
                    "lte": range.end_timestamp(),
                }
            }
        }));
    }
    if let Some(domain) = domain_clause(&query.domains) {
        must.push(domain);
    }
    if let Some(phrase) = &query.phrase {
        must.push(json!({ "match_phrase": { "summary": phrase } }));
        must.push(json!({ "match_phrase": { "body": phrase } }));
        must.push(json!({
            "match": { "summary": { "query": phrase, "minimum_should_match": "95%" } }
        }));
        must.push(json!({
            "match": { "body": { "query": phrase, "minimum_should_match": "95%" } }
        }));
    }

    let must_not: Vec<JsonValue> = query
        .missing_fields
        .iter()
        .map(|field| json!({ "exists": { "field": field } }))
        .collect();

    let mut bool_query = serde_json::Map::new();
    if !must.is_empty() {
        bool_query.insert("must".to_string(), JsonValue::Array(must));
    }
    if !must_not.is_empty() {
        bool_query.insert("must_not".to_string(), JsonValue::Array(must_not));
    }

    let mut body = json!({
        "size": size,
        "query": { "bool": bool_query },
    });
    if query.phrase.is_some() {
        body["min_score"] = json!(1);
    }
    body
}

/// Body for `_count`, restricted to one domain when given.
pub fn count_body(domain: Option<&str>) -> JsonValue {
    match domain {
        Some(domain) => json!({ "query": { "term": { "domain.keyword": domain } } }),
        None => json!({ "query": { "match_all": {} } }),
    }
}

/// Script-score cosine similarity over documents that have `field`.
pub fn similarity_body(field: &str, vector: &[f32], top_k: usize) -> JsonValue {
    json!({
        "size": top_k,
        "query": {
            "bool": {
                "must": [
                    {
                        "script_score": {
                            "query": { "match_all": {} },
                            "script": {
                                "source": format!("cosineSimilarity(params.query_vector, '{}') + 1.0", field),
                                "params": { "query_vector": vector },
                            }
                        }
                    },
                    { "exists": { "field": field } }
                ]
            }
        },
        "_source": { "includes": ["title", "summary", "body"] },
    })
}

/// Mapping update adding a dense vector property.
pub fn vector_mapping_body(field: &str, dimension: usize) -> JsonValue {
    json!({
        "properties": {
            field: { "type": "dense_vector", "dims": dimension }
        }
    })
}
