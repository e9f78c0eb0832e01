//! # curator-inference
//!
//! Language-model side of the curator pipelines.
//!
//! This crate provides:
//! - OpenAI-compatible generation and embedding backend
//! - Keyword normalization for model output (repair, parse, dedup, partition)
//! - Topic modeling over token-windowed documents
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use curator_core::{TiktokenTokenizer, TopicList};
//! use curator_inference::{OpenAIBackend, TopicModeler, TopicModelingConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let modeler = TopicModeler::new(
//!         Arc::new(OpenAIBackend::from_env().unwrap()),
//!         Arc::new(TiktokenTokenizer::cl100k().unwrap()),
//!         TopicList::new(vec!["Taproot".to_string(), "Lightning".to_string()]),
//!         TopicModelingConfig::default(),
//!     );
//!     let extraction = modeler.apply("Taproot activation is near.").await.unwrap();
//!     println!("{:?}", extraction.primary);
//! }
//! ```

pub mod keywords;
pub mod openai;
pub mod topics;

// Re-export core types
pub use curator_core::*;

pub use keywords::{
    clean_model_response, normalize_keywords, partition_keywords, KeywordAccumulator,
    KeywordOutcome, SkipReason,
};
pub use openai::{OpenAIBackend, OpenAIConfig};
pub use topics::{TopicModeler, TopicModelingConfig, SYSTEM_MESSAGE};
