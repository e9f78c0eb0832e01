//! Elasticsearch REST client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};

use curator_core::{
    logging, DocumentPatch, DocumentQuery, DocumentRecord, Error, Result, RetryPolicy,
    SearchIndex, SimilarDocument,
};

use crate::config::ElasticsearchConfig;
use crate::query;
use crate::types::*;

/// Elasticsearch client implementing [`SearchIndex`].
pub struct ElasticsearchClient {
    client: Client,
    base_url: Url,
    config: ElasticsearchConfig,
    retry: RetryPolicy,
}

impl ElasticsearchClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ElasticsearchConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| Error::Config(format!("Invalid Elasticsearch URL {}: {}", config.url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Elasticsearch URL cannot be a base: {}",
                config.url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Index(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "index",
            component = "elasticsearch",
            url = %base_url,
            index = %config.index,
            fetch_size = config.fetch_size,
            "Initializing Elasticsearch client"
        );

        Ok(Self {
            client,
            base_url,
            config,
            retry: RetryPolicy::default(),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ElasticsearchConfig::from_env()?)
    }

    /// Replace the retry policy applied to every request.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ElasticsearchConfig {
        &self.config
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Build a request with basic auth if configured.
    fn build_request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let mut req = self.client.request(method, self.endpoint(segments));
        if let Some(ref username) = self.config.username {
            req = req.basic_auth(username, self.config.password.as_ref());
        }
        req
    }

    /// Send a JSON request under the retry policy and decode the response.
    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        operation: &str,
        method: Method,
        segments: &[&str],
        params: &[(&str, &str)],
        body: Option<&JsonValue>,
    ) -> Result<T> {
        self.retry
            .run(operation, || async {
                let mut req = self.build_request(method.clone(), segments).query(params);
                if let Some(body) = body {
                    req = req.json(body);
                }
                let response = check_status(req.send().await?).await?;
                response
                    .json::<T>()
                    .await
                    .map_err(|e| Error::Index(format!("Failed to parse response: {}", e)))
            })
            .await
    }

    /// Run the scroll loop for `body`, collecting every hit in fetch order.
    async fn scroll_all(&self, body: &JsonValue) -> Result<Vec<Hit>> {
        let keep_alive = self.config.scroll_keep_alive.as_str();
        let mut page: SearchResponse = self
            .send_json(
                "es.search",
                Method::POST,
                &[self.config.index.as_str(), "_search"],
                &[("scroll", keep_alive)],
                Some(body),
            )
            .await?;

        let mut hits = Vec::new();
        let mut scroll_id = page.scroll_id.take();
        while !page.hits.hits.is_empty() {
            hits.append(&mut page.hits.hits);
            let Some(id) = scroll_id.as_deref() else {
                break;
            };
            debug!(
                subsystem = "index",
                component = "elasticsearch",
                fetched = hits.len(),
                "Fetching next scroll page"
            );
            let scroll_body = json!({ "scroll": keep_alive, "scroll_id": id });
            page = self
                .send_json(
                    "es.scroll",
                    Method::POST,
                    &["_search", "scroll"],
                    &[],
                    Some(&scroll_body),
                )
                .await?;
            if page.scroll_id.is_some() {
                scroll_id = page.scroll_id.take();
            }
        }

        if let Some(id) = scroll_id {
            self.clear_scroll(&id).await;
        }
        Ok(hits)
    }

    /// Release a scroll context. Failures are logged and ignored.
    async fn clear_scroll(&self, scroll_id: &str) {
        let result = self
            .build_request(Method::DELETE, &["_search", "scroll"])
            .json(&json!({ "scroll_id": [scroll_id] }))
            .send()
            .await;
        match result {
            Ok(resp) if resp.status().is_success() || resp.status() == StatusCode::NOT_FOUND => {}
            Ok(resp) => debug!(
                subsystem = "index",
                component = "elasticsearch",
                status = resp.status().as_u16(),
                "Failed to clear scroll context"
            ),
            Err(e) => debug!(
                subsystem = "index",
                component = "elasticsearch",
                { logging::ERROR_MSG } = %e,
                "Failed to clear scroll context"
            ),
        }
    }
}

/// Map a non-success response to the matching error class.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let reason = serde_json::from_str::<ElasticErrorResponse>(&text)
        .map(|body| body.reason())
        .unwrap_or(text);
    Err(status_error(status, &reason))
}

/// Classify an HTTP failure from Elasticsearch.
pub fn status_error(status: StatusCode, reason: &str) -> Error {
    let message = format!("Elasticsearch returned {}: {}", status, reason);
    match status.as_u16() {
        401 | 403 => Error::Unauthorized(message),
        404 => Error::NotFound(message),
        429 | 502 | 503 | 504 => Error::ServiceUnavailable(message),
        _ => Error::Index(message),
    }
}

#[async_trait]
impl SearchIndex for ElasticsearchClient {
    async fn ping(&self) -> Result<()> {
        let response = self
            .build_request(Method::GET, &[])
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| Error::ServiceUnavailable(format!("Elasticsearch unreachable: {}", e)))?;
        check_status(response).await?;
        debug!(subsystem = "index", component = "elasticsearch", "Connected to Elasticsearch");
        Ok(())
    }

    async fn fetch_documents(&self, query: &DocumentQuery) -> Result<Vec<DocumentRecord>> {
        let start = Instant::now();
        let body = query::search_body(query, self.config.fetch_size);
        debug!(
            subsystem = "index",
            component = "elasticsearch",
            op = "fetch_documents",
            domains = ?query.domains,
            date_range = ?query.date_range,
            missing = ?query.missing_fields,
            phrase = ?query.phrase,
            "Fetching documents"
        );

        let records: Vec<DocumentRecord> = self
            .scroll_all(&body)
            .await?
            .into_iter()
            .map(Hit::into_record)
            .collect();

        info!(
            subsystem = "index",
            component = "elasticsearch",
            op = "fetch_documents",
            { logging::RESULT_COUNT } = records.len(),
            { logging::DURATION_MS } = start.elapsed().as_millis() as u64,
            "Documents fetched"
        );
        Ok(records)
    }

    async fn update_document(&self, index: &str, id: &str, patch: &DocumentPatch) -> Result<()> {
        if patch.is_empty() {
            warn!(
                subsystem = "index",
                component = "elasticsearch",
                { logging::DOC_ID } = id,
                "Nothing to update, empty patch"
            );
            return Ok(());
        }

        let mut body = json!({ "doc": patch.fields });
        if patch.upsert {
            body["doc_as_upsert"] = json!(true);
        }
        let _: JsonValue = self
            .send_json("es.update", Method::POST, &[index, "_update", id], &[], Some(&body))
            .await?;
        debug!(
            subsystem = "index",
            component = "elasticsearch",
            op = "update_document",
            { logging::DOC_ID } = id,
            "Document updated"
        );
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<()> {
        let _: JsonValue = self
            .send_json("es.delete", Method::DELETE, &[index, "_doc", id], &[], None)
            .await?;
        debug!(
            subsystem = "index",
            component = "elasticsearch",
            op = "delete_document",
            { logging::DOC_ID } = id,
            "Document deleted"
        );
        Ok(())
    }

    async fn count_documents(&self, domain: Option<&str>) -> Result<u64> {
        let body = query::count_body(domain);
        let response: CountResponse = self
            .send_json(
                "es.count",
                Method::POST,
                &[self.config.index.as_str(), "_count"],
                &[],
                Some(&body),
            )
            .await?;
        Ok(response.count)
    }

    async fn add_vector_field(&self, field: &str, dimension: usize) -> Result<()> {
        let body = query::vector_mapping_body(field, dimension);
        let response: JsonValue = self
            .send_json(
                "es.put_mapping",
                Method::PUT,
                &[self.config.index.as_str(), "_mapping"],
                &[],
                Some(&body),
            )
            .await?;
        info!(
            subsystem = "index",
            component = "elasticsearch",
            field,
            dimension,
            response = %response,
            "Vector field mapping updated"
        );
        Ok(())
    }

    async fn similar_documents(
        &self,
        field: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SimilarDocument>> {
        let body = query::similarity_body(field, vector, top_k);
        let response: SearchResponse = self
            .send_json(
                "es.similarity",
                Method::POST,
                &[self.config.index.as_str(), "_search"],
                &[],
                Some(&body),
            )
            .await?;
        Ok(response
            .hits
            .hits
            .into_iter()
            .map(Hit::into_similar)
            .collect())
    }

    fn index_name(&self) -> &str {
        &self.config.index
    }
}
