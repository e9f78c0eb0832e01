//! OpenAI-compatible inference backend.
//!
//! Chat completions drive keyword extraction and the embeddings endpoint
//! produces summary vectors. Any endpoint speaking the same API works,
//! including local servers that need no API key.
//!
//! # Example
//!
//! ```rust,no_run
//! use curator_inference::openai::{OpenAIBackend, OpenAIConfig};
//! use curator_core::GenerationBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OpenAIBackend::new(OpenAIConfig {
//!         base_url: "http://localhost:8000/v1".to_string(),
//!         gen_model: "llama3".to_string(),
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//!     let reply = backend.generate("Name three Bitcoin BIPs").await.unwrap();
//!     println!("{}", reply);
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{
    GenerationParams, OpenAIBackend, OpenAIConfig, DEFAULT_DIMENSION, DEFAULT_EMBED_MODEL,
    DEFAULT_GEN_MODEL, DEFAULT_OPENAI_URL, DEFAULT_TIMEOUT_SECS,
};
pub use error::{to_curator_error, OpenAIErrorCode};
pub use types::*;
