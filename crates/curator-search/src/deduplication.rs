//! Duplicate resolution for re-ingested index documents.
//!
//! Scrapers re-ingest the same logical document under new `_id`s, sometimes
//! at a different URL. This module clusters candidate duplicates by a
//! composite key and decides, per cluster, which records to keep:
//!
//! 1. Groups of one record are kept.
//! 2. Groups whose records all share one URL keep the **last** record.
//! 3. Groups whose URLs differ but end in the same path segment are walked
//!    in order; each distinct URL is decided once, and URLs under a policy
//!    base survive only when they match the policy's dated pattern.
//! 4. Groups whose last segments differ keep the first record per URL.
//!
//! A final pass drops every kept record whose URL is still held by another
//! kept record, so the surviving set has at most one record per URL. That
//! pass spans groups, so it can drop a singleton and a rerun over the kept
//! records is not guaranteed to delete nothing.
//!
//! The keep-last rule depends on input order: pass records in the order the
//! index returned them.

use std::collections::{HashMap, HashSet};

use curator_core::{defaults, logging, DocumentRecord, Error, GroupingKey, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

static DATED_TRANSCRIPTS: Lazy<UrlPolicy> = Lazy::new(|| UrlPolicy {
    base: defaults::DATED_URL_BASE.to_string(),
    pattern: Regex::new(defaults::DATED_URL_PATTERN).expect("valid default URL pattern"),
});

/// URLs containing `base` are only kept when they match `pattern`.
#[derive(Debug, Clone)]
pub struct UrlPolicy {
    pub base: String,
    pub pattern: Regex,
}

impl UrlPolicy {
    /// Build a policy, compiling `pattern`.
    ///
    /// # Errors
    /// Returns `Error::Config` when the pattern is not a valid regex.
    pub fn new(base: impl Into<String>, pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::Config(format!("Invalid URL policy pattern: {}", e)))?;
        Ok(Self {
            base: base.into(),
            pattern,
        })
    }

    /// The btctranscripts dev-tech policy: only `YYYY-MM/` paths survive.
    pub fn dated_transcripts() -> Self {
        DATED_TRANSCRIPTS.clone()
    }

    /// `None` when the policy does not apply to `url`, otherwise whether it keeps it.
    fn decide(&self, url: &str) -> Option<bool> {
        url.contains(self.base.as_str())
            .then(|| self.pattern.is_match(url))
    }
}

/// Configuration for duplicate resolution.
#[derive(Debug, Clone)]
pub struct DeduplicationConfig {
    /// Policies checked in order; the first whose base occurs in a URL decides it.
    pub url_policies: Vec<UrlPolicy>,
}

impl Default for DeduplicationConfig {
    fn default() -> Self {
        Self {
            url_policies: vec![UrlPolicy::dated_transcripts()],
        }
    }
}

impl DeduplicationConfig {
    fn url_allowed(&self, url: &str) -> bool {
        self.url_policies
            .iter()
            .find_map(|policy| policy.decide(url))
            .unwrap_or(true)
    }
}

/// Outcome of a resolution pass. All id lists follow input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateResolution {
    /// Records to delete from the index.
    pub delete_ids: Vec<String>,
    /// Records that survive.
    pub keep_ids: Vec<String>,
    /// Records excluded from grouping because a key field or the URL was missing.
    pub skipped_ids: Vec<String>,
}

impl DuplicateResolution {
    /// Number of records that took part in grouping.
    pub fn grouped_count(&self) -> usize {
        self.delete_ids.len() + self.keep_ids.len()
    }
}

/// Resolve duplicates with the default URL policy.
pub fn resolve_duplicates(records: &[DocumentRecord]) -> DuplicateResolution {
    resolve_duplicates_with(records, &DeduplicationConfig::default())
}

/// Resolve duplicates with explicit URL policies.
pub fn resolve_duplicates_with(
    records: &[DocumentRecord],
    config: &DeduplicationConfig,
) -> DuplicateResolution {
    let mut skipped_ids = Vec::new();
    let mut candidates: Vec<(&DocumentRecord, &str)> = Vec::with_capacity(records.len());
    let mut group_of: HashMap<GroupingKey, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for record in records {
        let key = match record.grouping_key() {
            Ok(key) => key,
            Err(field) => {
                warn!(
                    subsystem = "search",
                    component = "deduplication",
                    { logging::DOC_ID } = %record.id,
                    missing = field,
                    "Record lacks a grouping field, skipping"
                );
                skipped_ids.push(record.id.clone());
                continue;
            }
        };
        let Some(url) = record.url.as_deref() else {
            warn!(
                subsystem = "search",
                component = "deduplication",
                { logging::DOC_ID } = %record.id,
                missing = "url",
                "Record lacks a URL, skipping"
            );
            skipped_ids.push(record.id.clone());
            continue;
        };

        let position = candidates.len();
        candidates.push((record, url));
        let group = *group_of.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[group].push(position);
    }

    let mut kept: HashSet<usize> = HashSet::new();
    for members in &groups {
        kept.extend(resolve_group(&candidates, members, config));
    }

    // Strict one-record-per-URL across every group.
    let mut url_counts: HashMap<&str, usize> = HashMap::new();
    for &position in &kept {
        *url_counts.entry(candidates[position].1).or_default() += 1;
    }
    kept.retain(|&position| url_counts[candidates[position].1] == 1);

    let mut delete_ids = Vec::new();
    let mut keep_ids = Vec::new();
    for (position, (record, _)) in candidates.iter().enumerate() {
        if kept.contains(&position) {
            keep_ids.push(record.id.clone());
        } else {
            delete_ids.push(record.id.clone());
        }
    }

    info!(
        subsystem = "search",
        component = "deduplication",
        op = "resolve_duplicates",
        total = records.len(),
        groups = groups.len(),
        keeping = keep_ids.len(),
        dropping = delete_ids.len(),
        skipped = skipped_ids.len(),
        "Duplicate resolution complete"
    );

    DuplicateResolution {
        delete_ids,
        keep_ids,
        skipped_ids,
    }
}

/// Positions of the group members to keep, before the global URL pass.
fn resolve_group(
    candidates: &[(&DocumentRecord, &str)],
    members: &[usize],
    config: &DeduplicationConfig,
) -> Vec<usize> {
    let url = |position: usize| candidates[position].1;

    if members.len() == 1 {
        return members.to_vec();
    }

    let distinct_urls: HashSet<&str> = members.iter().map(|&p| url(p)).collect();
    if distinct_urls.len() == 1 {
        return members.last().copied().into_iter().collect();
    }

    let last_segments: HashSet<&str> = distinct_urls.iter().map(|u| last_segment(u)).collect();
    let same_tail = last_segments.len() == 1;
    debug!(
        subsystem = "search",
        component = "deduplication",
        members = members.len(),
        distinct_urls = distinct_urls.len(),
        same_tail,
        "Resolving multi-URL group"
    );

    let mut seen: HashSet<&str> = HashSet::new();
    let mut keep = Vec::new();
    for &position in members {
        let this_url = url(position);
        if !seen.insert(this_url) {
            continue;
        }
        if !same_tail || config.url_allowed(this_url) {
            keep.push(position);
        }
    }
    keep
}

/// Text after the final `/`; empty for trailing-slash URLs.
fn last_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, title: &str, url: &str) -> DocumentRecord {
        DocumentRecord {
            id: id.to_string(),
            index_name: Some("idx".into()),
            title: Some(title.into()),
            created_at: Some("2023-04-01".into()),
            transcript_by: Some("bot".into()),
            domain: Some("https://btctranscripts.com/".into()),
            body_type: Some("markdown".into()),
            url: Some(url.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("https://a.com/x/y"), "y");
        assert_eq!(last_segment("https://a.com/x/"), "");
        assert_eq!(last_segment("no-slash"), "no-slash");
    }

    #[test]
    fn test_single_record_kept() {
        let records = vec![record("a", "T", "https://x.com/1")];
        let result = resolve_duplicates(&records);
        assert!(result.delete_ids.is_empty());
        assert_eq!(result.keep_ids, vec!["a"]);
    }

    #[test]
    fn test_same_url_keeps_last() {
        let records = vec![
            record("1", "T", "https://x.com/p"),
            record("2", "T", "https://x.com/p"),
            record("3", "T", "https://x.com/p"),
        ];
        let result = resolve_duplicates(&records);
        assert_eq!(result.delete_ids, vec!["1", "2"]);
        assert_eq!(result.keep_ids, vec!["3"]);
    }

    #[test]
    fn test_dated_policy_rejects_undated_url() {
        let records = vec![
            record("a", "T", "https://btctranscripts.com/bitcoin-core-dev-tech/2023-04/x"),
            record("b", "T", "https://btctranscripts.com/bitcoin-core-dev-tech/x"),
        ];
        let result = resolve_duplicates(&records);
        assert_eq!(result.delete_ids, vec!["b"]);
        assert_eq!(result.keep_ids, vec!["a"]);
    }

    #[test]
    fn test_distinct_tails_keep_first_per_url() {
        let records = vec![
            record("1", "T", "https://x.com/a"),
            record("2", "T", "https://x.com/b"),
            record("3", "T", "https://x.com/a"),
        ];
        let result = resolve_duplicates(&records);
        assert_eq!(result.keep_ids, vec!["1", "2"]);
        assert_eq!(result.delete_ids, vec!["3"]);
    }

    #[test]
    fn test_same_tail_outside_policy_keeps_each_url_once() {
        let records = vec![
            record("1", "T", "https://one.com/post"),
            record("2", "T", "https://two.com/post"),
            record("3", "T", "https://one.com/post"),
        ];
        let result = resolve_duplicates(&records);
        assert_eq!(result.keep_ids, vec!["1", "2"]);
        assert_eq!(result.delete_ids, vec!["3"]);
    }

    #[test]
    fn test_custom_policy() {
        let config = DeduplicationConfig {
            url_policies: vec![UrlPolicy::new("https://x.com/", r"^https://x\.com/v2/").unwrap()],
        };
        let records = vec![
            record("1", "T", "https://x.com/v1/page"),
            record("2", "T", "https://x.com/v2/page"),
        ];
        let result = resolve_duplicates_with(&records, &config);
        assert_eq!(result.keep_ids, vec!["2"]);
        assert_eq!(result.delete_ids, vec!["1"]);
    }

    #[test]
    fn test_invalid_policy_pattern() {
        let err = UrlPolicy::new("https://x.com/", "(").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_records_missing_fields_are_skipped() {
        let mut no_title = record("1", "T", "https://x.com/p");
        no_title.title = None;
        let mut no_url = record("2", "T", "https://x.com/p");
        no_url.url = None;
        let records = vec![no_title, no_url, record("3", "T", "https://x.com/p")];

        let result = resolve_duplicates(&records);
        assert_eq!(result.skipped_ids, vec!["1", "2"]);
        assert_eq!(result.keep_ids, vec!["3"]);
        assert!(result.delete_ids.is_empty());
        assert_eq!(result.grouped_count(), 1);
    }

    #[test]
    fn test_global_pass_drops_shared_urls_across_groups() {
        let records = vec![
            record("1", "Title A", "https://x.com/shared"),
            record("2", "Title B", "https://x.com/shared"),
        ];
        let result = resolve_duplicates(&records);
        assert!(result.keep_ids.is_empty());
        assert_eq!(result.delete_ids, vec!["1", "2"]);
    }

    #[test]
    fn test_empty_input() {
        let result = resolve_duplicates(&[]);
        assert_eq!(result, DuplicateResolution::default());
    }
}
