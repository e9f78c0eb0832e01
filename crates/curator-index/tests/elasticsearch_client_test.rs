//! Request-shape and error-mapping tests for the Elasticsearch client.

use std::time::Duration;

use curator_core::{DocumentPatch, DocumentQuery, Error, RetryPolicy, SearchIndex};
use curator_index::{ElasticsearchClient, ElasticsearchConfig};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ElasticsearchClient {
    ElasticsearchClient::new(ElasticsearchConfig {
        url: server.uri(),
        username: Some("user".to_string()),
        password: Some("pass".to_string()),
        index: "docs".to_string(),
        fetch_size: 2,
        ..Default::default()
    })
    .expect("client")
    .with_retry_policy(RetryPolicy::no_retry())
}

fn hit(id: &str, url: &str) -> serde_json::Value {
    json!({
        "_index": "docs",
        "_id": id,
        "_score": 1.0,
        "_source": {
            "id": format!("source-{}", id),
            "title": "Package relay",
            "domain": "https://btctranscripts.com/",
            "url": url,
        }
    })
}

#[tokio::test]
async fn test_fetch_documents_follows_scroll_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/docs/_search"))
        .and(query_param("scroll", "5m"))
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .and(body_partial_json(json!({
            "size": 2,
            "query": { "bool": { "must": [{ "term": { "domain.keyword": "https://btctranscripts.com/" } }] } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_scroll_id": "s1",
            "hits": { "hits": [hit("1", "https://a/1"), hit("2", "https://a/2")] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/_search/scroll"))
        .and(body_partial_json(json!({ "scroll_id": "s1", "scroll": "5m" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_scroll_id": "s2",
            "hits": { "hits": [hit("3", "https://a/3")] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/_search/scroll"))
        .and(body_partial_json(json!({ "scroll_id": "s2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_scroll_id": "s2",
            "hits": { "hits": [] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/_search/scroll"))
        .and(body_json(json!({ "scroll_id": ["s2"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "succeeded": true })))
        .expect(1)
        .mount(&server)
        .await;

    let docs = client(&server)
        .fetch_documents(&DocumentQuery::for_domain(Some("https://btctranscripts.com/")))
        .await
        .unwrap();

    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(docs[0].source_id.as_deref(), Some("source-1"));
    assert_eq!(docs[2].url.as_deref(), Some("https://a/3"));
}

#[tokio::test]
async fn test_update_document_with_upsert() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/docs/_update/abc"))
        .and(body_json(json!({
            "doc": { "summary_vector_embeddings": [0.5, 0.5] },
            "doc_as_upsert": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "updated" })))
        .expect(1)
        .mount(&server)
        .await;

    let patch = DocumentPatch::new()
        .set("summary_vector_embeddings", vec![0.5f32, 0.5])
        .with_upsert(true);
    client(&server)
        .update_document("docs", "abc", &patch)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_empty_patch_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    client(&server)
        .update_document("docs", "abc", &DocumentPatch::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_missing_document_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/docs/_doc/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "_index": "docs",
            "_id": "gone",
            "result": "not_found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .delete_document("docs", "gone")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_unavailable_cluster_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/docs/_count"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": { "type": "unavailable", "reason": "cluster busy" },
            "status": 503
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/docs/_count"))
        .and(body_json(json!({ "query": { "term": { "domain.keyword": "d" } } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 42 })))
        .expect(1)
        .mount(&server)
        .await;

    let retry = RetryPolicy::default()
        .with_max_attempts(2)
        .with_initial_backoff(Duration::from_millis(1));
    let count = client(&server)
        .with_retry_policy(retry)
        .count_documents(Some("d"))
        .await
        .unwrap();
    assert_eq!(count, 42);
}

#[tokio::test]
async fn test_unauthorized_is_fatal_and_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/docs/_count"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "type": "security_exception", "reason": "unable to authenticate user" },
            "status": 401
        })))
        .expect(1)
        .mount(&server)
        .await;

    let retry = RetryPolicy::default()
        .with_max_attempts(3)
        .with_initial_backoff(Duration::from_millis(1));
    let err = client(&server)
        .with_retry_policy(retry)
        .count_documents(None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(ref m) if m.contains("unable to authenticate user")));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_similar_documents() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/docs/_search"))
        .and(body_partial_json(json!({
            "size": 3,
            "_source": { "includes": ["title", "summary", "body"] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": { "hits": [
                { "_index": "docs", "_id": "1", "_score": 1.9,
                  "_source": { "title": "Reorgs", "summary": "", "body": "Stale blocks..." } }
            ] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let matches = client(&server)
        .similar_documents("summary_vector", &[0.6, 0.8], 3)
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].title.as_deref(), Some("Reorgs"));
    assert_eq!(matches[0].summary.as_deref(), Some("Stale blocks..."));
    assert_eq!(matches[0].score, Some(1.9));
}

#[tokio::test]
async fn test_add_vector_field() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/docs/_mapping"))
        .and(body_json(json!({
            "properties": {
                "summary_vector_embeddings": { "type": "dense_vector", "dims": 1024 }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "acknowledged": true })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .add_vector_field("summary_vector_embeddings", 1024)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_ping() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tagline": "You Know, for Search" })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).ping().await.unwrap();
}
