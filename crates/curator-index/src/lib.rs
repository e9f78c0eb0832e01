//! # curator-index
//!
//! Elasticsearch client for the curator pipelines.
//!
//! Implements [`curator_core::SearchIndex`] over the REST API: scroll
//! search with domain, date, missing-field, and phrase filters, partial
//! updates, deletes, counts, mapping updates, and script-score similarity.
//!
//! # Example
//!
//! ```rust,no_run
//! use curator_core::{DocumentQuery, SearchIndex};
//! use curator_index::ElasticsearchClient;
//!
//! #[tokio::main]
//! async fn main() -> curator_core::Result<()> {
//!     let client = ElasticsearchClient::from_env()?;
//!     client.ping().await?;
//!     let query = DocumentQuery::for_domain(Some("https://delvingbitcoin.org/"))
//!         .missing("primary_topics");
//!     let docs = client.fetch_documents(&query).await?;
//!     println!("{} documents without topics", docs.len());
//!     Ok(())
//! }
//! ```

mod client;
pub mod config;
pub mod query;
pub mod types;

pub use client::{status_error, ElasticsearchClient};
pub use config::{decode_cloud_id, ElasticsearchConfig};
