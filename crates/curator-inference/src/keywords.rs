//! Keyword normalization for language-model output.
//!
//! The completion model is asked for a list literal of topics. What comes
//! back is often truncated by the token cap, wrapped in a preamble, or not a
//! list at all. [`normalize_keywords`] repairs the truncations it recognizes,
//! parses the rest with the list-literal parser, and reports anything else as
//! a [`SkipReason`] so the caller can move on to the next chunk.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use curator_core::{
    normalize_for_comparison, parse_string_list, KeywordExtraction, ListLiteralError, TopicList,
};

static INNER_APOSTROPHE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w)'(\w)").expect("valid regex"));

/// Preambles the model sometimes puts in front of the list.
const RESPONSE_PREAMBLES: &[&str] = &[
    "The relevant topics for the given content are: ",
    "The relevant topics extracted from the provided content are: ",
];

/// Why a model response contributed no keywords.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("model returned an empty list")]
    Empty,

    #[error("response is not a list literal")]
    Unparseable,

    #[error("malformed list literal: {0}")]
    Malformed(#[from] ListLiteralError),
}

/// Result of normalizing one model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordOutcome {
    Parsed(Vec<String>),
    Skip(SkipReason),
}

impl KeywordOutcome {
    /// Keywords carried by this outcome, empty for a skip.
    pub fn into_keywords(self) -> Vec<String> {
        match self {
            KeywordOutcome::Parsed(keywords) => keywords,
            KeywordOutcome::Skip(_) => Vec::new(),
        }
    }
}

/// Strip newlines, surrounding whitespace, and known preambles.
pub fn clean_model_response(raw: &str) -> String {
    let mut text = raw.replace('\n', "").trim().to_string();
    for preamble in RESPONSE_PREAMBLES {
        text = text.replace(preamble, "");
    }
    text
}

/// Turn one raw model response into a keyword list or a skip signal.
pub fn normalize_keywords(raw: &str) -> KeywordOutcome {
    let trimmed = raw.trim();
    if matches!(trimmed, "[]" | "['']" | "[\"\"]") {
        return KeywordOutcome::Skip(SkipReason::Empty);
    }

    let mut text = INNER_APOSTROPHE_RE
        .replace_all(trimmed, r"${1}\'${2}")
        .into_owned();

    let closed = text.ends_with("']") || text.ends_with("\"]");
    match opening_quote(&text) {
        Some(quote) if !closed => {
            warn!(
                subsystem = "inference",
                component = "keywords",
                response = %text,
                "Model output is truncated, repairing"
            );
            text = repair_truncated(&text, quote);
            warn!(
                subsystem = "inference",
                component = "keywords",
                repaired = %text,
                "Repaired model output"
            );
        }
        None if !closed => {
            debug!(
                subsystem = "inference",
                component = "keywords",
                response = %text,
                "Model output is not a list literal"
            );
            return KeywordOutcome::Skip(SkipReason::Unparseable);
        }
        _ => {}
    }

    match parse_string_list(&text) {
        Ok(items) => KeywordOutcome::Parsed(
            items
                .into_iter()
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect(),
        ),
        Err(e) => {
            warn!(
                subsystem = "inference",
                component = "keywords",
                response = %text,
                error = %e,
                "Failed to parse model output"
            );
            KeywordOutcome::Skip(SkipReason::Malformed(e))
        }
    }
}

fn opening_quote(text: &str) -> Option<char> {
    if text.starts_with("['") {
        Some('\'')
    } else if text.starts_with("[\"") {
        Some('"')
    } else {
        None
    }
}

/// Close a list literal cut off mid-way. First matching ending wins.
fn repair_truncated(text: &str, q: char) -> String {
    if text.ends_with(&format!("{q},")) {
        format!("{}]", &text[..text.len() - 1])
    } else if text.ends_with(&format!("{q}, {q}")) {
        format!("{}]", &text[..text.len() - 3])
    } else if text.ends_with(q) {
        format!("{}]", text)
    } else if text.ends_with(&format!("{q},...")) {
        format!("{}]", &text[..text.len() - 4])
    } else if text.ends_with(&format!("{q}, ...]")) {
        format!("{}]", &text[..text.len() - 6])
    } else {
        format!("{}{q}]", text)
    }
}

/// Collects keywords across chunks with set semantics, keeping first-seen order.
#[derive(Debug, Default, Clone)]
pub struct KeywordAccumulator {
    seen: HashSet<String>,
    keywords: Vec<String>,
}

impl KeywordAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add keywords, ignoring ones already collected.
    pub fn extend<I>(&mut self, keywords: I)
    where
        I: IntoIterator<Item = String>,
    {
        for keyword in keywords {
            if self.seen.insert(keyword.clone()) {
                self.keywords.push(keyword);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn into_keywords(self) -> Vec<String> {
        self.keywords
    }
}

/// Split keywords into vocabulary matches and everything else.
///
/// Matching compares [`normalize_for_comparison`] forms; the original strings
/// and their order are kept in the output.
pub fn partition_keywords(keywords: &[String], topics: &TopicList) -> KeywordExtraction {
    let vocabulary: HashSet<String> = topics.iter().map(|t| normalize_for_comparison(t)).collect();

    let (primary, secondary) = keywords
        .iter()
        .cloned()
        .partition(|keyword| vocabulary.contains(&normalize_for_comparison(keyword)));

    KeywordExtraction { primary, secondary }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(items: &[&str]) -> KeywordOutcome {
        KeywordOutcome::Parsed(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_truncated_after_quote_is_closed() {
        assert_eq!(
            normalize_keywords("['htlc', 'routing'"),
            parsed(&["htlc", "routing"])
        );
    }

    #[test]
    fn test_empty_lists_are_skipped() {
        assert_eq!(
            normalize_keywords("[]"),
            KeywordOutcome::Skip(SkipReason::Empty)
        );
        assert_eq!(
            normalize_keywords("  ['']  "),
            KeywordOutcome::Skip(SkipReason::Empty)
        );
    }

    #[test]
    fn test_repair_dangling_comma() {
        assert_eq!(normalize_keywords("['a', 'b',"), parsed(&["a", "b"]));
    }

    #[test]
    fn test_repair_dangling_open_quote() {
        assert_eq!(normalize_keywords("['a', 'b', '"), parsed(&["a", "b"]));
    }

    #[test]
    fn test_repair_ellipsis() {
        assert_eq!(normalize_keywords("['a', 'b',..."), parsed(&["a", "b"]));
        assert_eq!(normalize_keywords("['a', 'b', ...]"), parsed(&["a", "b"]));
    }

    #[test]
    fn test_repair_cut_inside_item() {
        assert_eq!(
            normalize_keywords("['taproot', 'schnorr sig"),
            parsed(&["taproot", "schnorr sig"])
        );
    }

    #[test]
    fn test_repair_double_quoted() {
        assert_eq!(
            normalize_keywords(r#"["taproot", "musig"#),
            parsed(&["taproot", "musig"])
        );
    }

    #[test]
    fn test_inner_apostrophe_survives() {
        assert_eq!(
            normalize_keywords("['Schnorr's signatures', 'taproot']"),
            parsed(&["Schnorr's signatures", "taproot"])
        );
    }

    #[test]
    fn test_prose_is_unparseable() {
        assert_eq!(
            normalize_keywords("There are no relevant topics in this content."),
            KeywordOutcome::Skip(SkipReason::Unparseable)
        );
        assert_eq!(
            normalize_keywords("__import__('os').system('ls')"),
            KeywordOutcome::Skip(SkipReason::Unparseable)
        );
    }

    #[test]
    fn test_malformed_list_is_skipped() {
        let outcome = normalize_keywords("['a' 'b']");
        assert!(matches!(
            outcome,
            KeywordOutcome::Skip(SkipReason::Malformed(ListLiteralError::ExpectedSeparator { .. }))
        ));
    }

    #[test]
    fn test_closed_but_not_opened_is_malformed() {
        let outcome = normalize_keywords("Topics: ['a']");
        assert!(matches!(
            outcome,
            KeywordOutcome::Skip(SkipReason::Malformed(_))
        ));
    }

    #[test]
    fn test_blank_items_dropped() {
        assert_eq!(normalize_keywords("[' htlc ', '  ']"), parsed(&["htlc"]));
    }

    #[test]
    fn test_clean_model_response() {
        assert_eq!(
            clean_model_response(
                "\nThe relevant topics extracted from the provided content are: ['a',\n 'b']  "
            ),
            "['a', 'b']"
        );
        assert_eq!(
            clean_model_response("The relevant topics for the given content are: []"),
            "[]"
        );
    }

    #[test]
    fn test_accumulator_dedups_in_first_seen_order() {
        let mut acc = KeywordAccumulator::new();
        acc.extend(vec!["b".to_string(), "a".to_string()]);
        acc.extend(vec!["a".to_string(), "c".to_string(), "b".to_string()]);
        assert_eq!(acc.len(), 3);
        assert_eq!(acc.into_keywords(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_partition_matches_normalized_topics() {
        let topics = TopicList::new(vec!["htlc routing".to_string()]);
        let keywords = vec!["HTLC Routing!".to_string(), "unrelated thing".to_string()];

        let extraction = partition_keywords(&keywords, &topics);
        assert_eq!(extraction.primary, vec!["HTLC Routing!"]);
        assert_eq!(extraction.secondary, vec!["unrelated thing"]);
    }

    #[test]
    fn test_partition_is_complete_and_ordered() {
        let topics = TopicList::new(vec![
            "Taproot".to_string(),
            "Lightning Network".to_string(),
        ]);
        let keywords: Vec<String> = ["fees", "lightning  network", "taproot", "mempool"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let extraction = partition_keywords(&keywords, &topics);
        assert_eq!(extraction.primary, vec!["lightning  network", "taproot"]);
        assert_eq!(extraction.secondary, vec!["fees", "mempool"]);
        assert_eq!(
            extraction.primary.len() + extraction.secondary.len(),
            keywords.len()
        );
    }
}
