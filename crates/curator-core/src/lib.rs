//! # curator-core
//!
//! Core types, traits, and text utilities for the curator pipelines.
//!
//! This crate provides the data model, error type, and collaborator traits
//! that the other curator crates depend on, along with the text helpers the
//! keyword normalizer and the jobs share.

pub mod defaults;
pub mod error;
pub mod list_literal;
pub mod logging;
pub mod models;
pub mod retry;
pub mod text;
pub mod tokenizer;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use list_literal::{format_string_list, parse_string_list, ListLiteralError};
pub use models::*;
pub use retry::{ErrorClass, RetryPolicy, TransientPolicy};
pub use text::{normalize_for_comparison, normalize_text, preprocess_email};
pub use tokenizer::*;
pub use traits::*;
