//! Text cleaning helpers shared by the keyword normalizer and the jobs.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"http\S+|www\S+|https\S+").expect("valid regex"));
static NON_ALNUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9 ]+").expect("valid regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static SPACE_COMMA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r". ,").expect("valid regex"));
static ISO_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("valid regex"));
static DATE_WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec|january|february|march|april|june|july|august|september|october|november|december|mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun|monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
    )
    .expect("valid regex")
});

/// Footer separating a mailing-list message from its scrubbed attachments.
const ATTACHMENT_FOOTER: &str = "-------------- next part --------------";

/// Canonical form used to compare keywords with vocabulary entries.
///
/// Lowercases, strips URLs, drops everything outside `[A-Za-z0-9 ]`, and
/// collapses whitespace. Total: any input produces a (possibly empty) string.
pub fn normalize_for_comparison(text: &str) -> String {
    let lowered = text.to_lowercase();
    let without_urls = URL_RE.replace_all(&lowered, "");
    let alnum = NON_ALNUM_RE.replace_all(&without_urls, "");
    WHITESPACE_RE.replace_all(&alnum, " ").trim().to_string()
}

/// Collapse whitespace and tidy punctuation left behind by line removal.
pub fn normalize_text(text: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(text, " ");
    let collapsed = collapsed.trim();
    let without_space_commas = SPACE_COMMA_RE.replace_all(collapsed, "");
    without_space_commas
        .replace("..", ".")
        .replace(". .", ".")
        .replace('#', "")
        .trim()
        .to_string()
}

/// Strip quoting, reply headers, and signatures from a mailing-list body.
///
/// Returns the attachment-stripped body unchanged when nothing survives.
pub fn preprocess_email(body: &str) -> String {
    let body = body.split(ATTACHMENT_FOOTER).next().unwrap_or_default();

    let kept: Vec<&str> = body.lines().filter(|line| keep_email_line(line)).collect();
    let normalized = normalize_text(&kept.join("\n"));

    if normalized.is_empty() {
        body.to_string()
    } else {
        normalized
    }
}

fn keep_email_line(line: &str) -> bool {
    if line.starts_with("On") && is_dated_reply_header(line) {
        return false;
    }
    if line.ends_with("> wrote:") || line.starts_with("Le ") || line.ends_with("crit :") {
        return false;
    }
    if ISO_DATE_RE.is_match(line) {
        return false;
    }

    let trimmed = line.trim_start();
    if line.starts_with("From:") || trimmed.starts_with("To:") || trimmed.starts_with("permalink")
    {
        return false;
    }
    if line.starts_with("Sent with Proton Mail") {
        return false;
    }

    !line.is_empty()
        && !line.starts_with('>')
        && !line.starts_with("-- ")
        && !line.starts_with('[')
        && !line.starts_with("_____")
}

/// "On Tue, Mar 5, 2024 at 10:00 ..." style header: still names a month or
/// weekday once digits are blanked.
fn is_dated_reply_header(line: &str) -> bool {
    let blanked: String = line
        .chars()
        .map(|c| if c.is_ascii_digit() || c == '-' { ' ' } else { c })
        .collect();
    DATE_WORD_RE.is_match(&blanked)
}
