//! Token counting, encoding, and token-window chunking.
//!
//! This module provides tokenization using the tiktoken library, which is
//! compatible with OpenAI's tokenization schemes, and the chunker that splits
//! document text into fixed-size token windows for the completion model.

use crate::error::{Error, Result};

/// Trait for tokenization operations.
///
/// Implementations should be thread-safe.
pub trait Tokenizer: Send + Sync {
    /// Count the number of tokens in the given text.
    fn count_tokens(&self, text: &str) -> usize;

    /// Encode text into token IDs.
    fn encode(&self, text: &str) -> Vec<u32>;

    /// Decode token IDs back into text.
    fn decode(&self, tokens: &[u32]) -> String;

    /// Get the name/identifier of this tokenizer.
    fn name(&self) -> &str;
}

/// Tiktoken-based tokenizer implementation.
pub struct TiktokenTokenizer {
    bpe: tiktoken_rs::CoreBPE,
    name: String,
}

impl TiktokenTokenizer {
    /// Create a new tokenizer for the specified model.
    ///
    /// # Errors
    /// Returns an error if the model is not recognized or BPE initialization fails.
    pub fn new(model: &str) -> Result<Self> {
        let bpe = tiktoken_rs::get_bpe_from_model(model)
            .map_err(|e| Error::Internal(format!("Failed to initialize tokenizer: {}", e)))?;

        Ok(Self {
            bpe,
            name: model.to_string(),
        })
    }

    /// Create the `cl100k_base` tokenizer used for chunking.
    pub fn cl100k() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| Error::Internal(format!("Failed to initialize cl100k_base: {}", e)))?;

        Ok(Self {
            bpe,
            name: "cl100k_base".to_string(),
        })
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|t| t as u32)
            .collect()
    }

    /// Bytes of a character split across windows decode as U+FFFD.
    fn decode(&self, tokens: &[u32]) -> String {
        let token_vec: Vec<usize> = tokens.iter().map(|&t| t as usize).collect();
        let bytes = self.bpe._decode_native(&token_vec);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Split `text` into consecutive windows of at most `max_tokens` tokens.
///
/// Each window is decoded back to text and trimmed; windows that hold only
/// whitespace are dropped. A window boundary inside a multi-byte character
/// leaves U+FFFD on both sides rather than losing the window. Order is
/// preserved and the last chunk may be shorter. A `max_tokens` of zero is
/// treated as one.
pub fn chunk_text(tokenizer: &dyn Tokenizer, text: &str, max_tokens: usize) -> Vec<String> {
    let tokens = tokenizer.encode(text);
    tokens
        .chunks(max_tokens.max(1))
        .map(|window| tokenizer.decode(window).trim().to_string())
        .filter(|chunk| !chunk.is_empty())
        .collect()
}
