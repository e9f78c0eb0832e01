//! # curator-search
//!
//! Index-side analysis for the curator pipelines.
//!
//! This crate provides:
//! - Duplicate resolution for re-ingested documents (grouping + URL policies)
//! - Question-to-document similarity over stored embeddings
//!
//! ## Example
//!
//! ```ignore
//! use curator_search::{resolve_duplicates, DocumentQuery, SearchIndex};
//!
//! let records = index.fetch_documents(&DocumentQuery::for_domain(Some(domain))).await?;
//! let resolution = resolve_duplicates(&records);
//! for id in &resolution.delete_ids {
//!     index.delete_document(index.index_name(), id).await?;
//! }
//! ```

pub mod deduplication;
pub mod semantic;

// Re-export core types
pub use curator_core::*;

pub use deduplication::{
    resolve_duplicates, resolve_duplicates_with, DeduplicationConfig, DuplicateResolution,
    UrlPolicy,
};
pub use semantic::{find_similar, l2_normalize};
