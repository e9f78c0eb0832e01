//! Behavioral tests for duplicate resolution over realistic batches.

use std::collections::HashSet;

use curator_core::DocumentRecord;
use curator_search::{resolve_duplicates, DuplicateResolution};

fn doc(id: &str, url: &str) -> DocumentRecord {
    DocumentRecord {
        id: id.to_string(),
        index_name: Some("transcripts".into()),
        title: Some("T".into()),
        domain: Some("d".into()),
        created_at: Some("2020".into()),
        transcript_by: Some("b".into()),
        body_type: Some("text".into()),
        url: Some(url.into()),
        ..Default::default()
    }
}

fn titled(id: &str, title: &str, url: &str) -> DocumentRecord {
    DocumentRecord {
        title: Some(title.into()),
        ..doc(id, url)
    }
}

fn survivors(records: &[DocumentRecord], resolution: &DuplicateResolution) -> Vec<DocumentRecord> {
    let keep: HashSet<&str> = resolution.keep_ids.iter().map(String::as_str).collect();
    records
        .iter()
        .filter(|r| keep.contains(r.id.as_str()))
        .cloned()
        .collect()
}

/// A batch shaped like a btctranscripts re-ingest: moved dev-tech pages,
/// repeated scrapes of the same URL, and unrelated singletons.
fn realistic_batch() -> Vec<DocumentRecord> {
    vec![
        titled("1", "Package Relay", "https://btctranscripts.com/bitcoin-core-dev-tech/package-relay"),
        titled("2", "Package Relay", "https://btctranscripts.com/bitcoin-core-dev-tech/2023-04/package-relay"),
        titled("3", "Package Relay", "https://btctranscripts.com/bitcoin-core-dev-tech/2023-04/package-relay"),
        titled("4", "Taproot Review", "https://btctranscripts.com/review/taproot"),
        titled("5", "Taproot Review", "https://btctranscripts.com/review/taproot"),
        titled("6", "Mempool", "https://btctranscripts.com/chaincode/mempool"),
        titled("7", "Mempool", "https://btctranscripts.com/chaincode/mempool-2"),
        titled("8", "Covenants", "https://btctranscripts.com/misc/covenants"),
    ]
}

#[test]
fn test_identical_urls_keep_last() {
    let records = vec![doc("1", "https://a/x"), doc("2", "https://a/x")];
    let result = resolve_duplicates(&records);
    assert_eq!(result.delete_ids, vec!["1"]);
    assert_eq!(result.keep_ids, vec!["2"]);
}

#[test]
fn test_distinct_urls_with_distinct_tails_are_both_kept() {
    let records = vec![doc("1", "https://a/x"), doc("2", "https://b/y")];
    let result = resolve_duplicates(&records);
    assert!(result.delete_ids.is_empty());
    assert_eq!(result.keep_ids, vec!["1", "2"]);
}

#[test]
fn test_realistic_batch_decisions() {
    let records = realistic_batch();
    let result = resolve_duplicates(&records);

    // "1" is an undated dev-tech URL; "3" repeats the URL of "2".
    // "4" and "5" share a URL, so the later scrape wins.
    assert_eq!(result.delete_ids, vec!["1", "3", "4"]);
    assert_eq!(result.keep_ids, vec!["2", "5", "6", "7", "8"]);
}

/// Holds for this batch because no URL is shared across grouping keys.
#[test]
fn test_rerun_on_batch_without_cross_group_urls_deletes_nothing() {
    let records = realistic_batch();
    let first = resolve_duplicates(&records);
    let kept = survivors(&records, &first);

    let second = resolve_duplicates(&kept);
    assert!(second.delete_ids.is_empty());
    assert_eq!(second.keep_ids, first.keep_ids);
}

#[test]
fn test_kept_urls_are_globally_unique() {
    let mut records = realistic_batch();
    records.push(titled("9", "Other Title", "https://btctranscripts.com/misc/covenants"));
    records.push(titled("10", "Third Title", "https://btctranscripts.com/misc/covenants"));

    let result = resolve_duplicates(&records);
    let kept = survivors(&records, &result);
    let urls: HashSet<&str> = kept.iter().filter_map(|r| r.url.as_deref()).collect();
    assert_eq!(urls.len(), kept.len());
    assert!(result.delete_ids.contains(&"8".to_string()));
}

/// Singletons survive only while no other kept record holds their URL.
#[test]
fn test_unique_keys_with_unshared_urls_never_deleted() {
    let records = vec![
        titled("1", "Alpha", "https://x.com/a"),
        titled("2", "Beta", "https://x.com/b"),
        titled("3", "Gamma", "https://x.com/c"),
        titled("4", "Gamma", "https://x.com/c"),
    ];
    let result = resolve_duplicates(&records);
    assert!(!result.delete_ids.contains(&"1".to_string()));
    assert!(!result.delete_ids.contains(&"2".to_string()));
    assert_eq!(result.delete_ids, vec!["3"]);
}

#[test]
fn test_every_grouped_record_is_decided_once() {
    let records = realistic_batch();
    let result = resolve_duplicates(&records);

    let deleted: HashSet<&String> = result.delete_ids.iter().collect();
    let kept: HashSet<&String> = result.keep_ids.iter().collect();
    assert!(deleted.is_disjoint(&kept));
    assert_eq!(deleted.len() + kept.len(), records.len());
}

/// The one-URL-per-keep-set pass can shrink a group, so a second pass takes
/// the dated-URL branch and deletes a record the first pass kept. It can also
/// delete singleton groups.
#[test]
fn test_cross_group_url_pass_breaks_rerun_stability() {
    let records = vec![
        titled("A", "T", "https://btctranscripts.com/bitcoin-core-dev-tech/x"),
        titled("B", "T", "https://btctranscripts.com/bitcoin-core-dev-tech/2023-04/x"),
        titled("C", "T", "https://other.com/y"),
        titled("D", "U", "https://other.com/y"),
    ];

    let first = resolve_duplicates(&records);
    assert_eq!(first.keep_ids, vec!["A", "B"]);
    assert_eq!(first.delete_ids, vec!["C", "D"]);

    let second = resolve_duplicates(&survivors(&records, &first));
    assert_eq!(second.delete_ids, vec!["A"]);
    assert_eq!(second.keep_ids, vec!["B"]);
}
