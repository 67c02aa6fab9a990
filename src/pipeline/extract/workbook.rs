//! Heuristic text recovery from spreadsheet binaries.
//!
//! Spreadsheet containers are mostly zip-compressed, so this scans the raw
//! bytes for readable runs and for text sitting between XML-style tags, then
//! deduplicates while preserving first-seen order.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::latin1_string;

const FALLBACK_TEXT: &str = "Unable to extract data from spreadsheet.";

static READABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[A-Za-z0-9][A-Za-z0-9\s.,;:!?'"()\-/%=+<>]{5,}"#).unwrap());
static TAG_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<[a-z][^>]*>([^<]+)<").unwrap());
static NUMERIC_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());

/// Scan raw spreadsheet bytes for recoverable text. Never fails; returns a
/// fixed placeholder when nothing readable is found.
pub fn extract_text(bytes: &[u8]) -> String {
    let text = latin1_string(bytes);
    let mut parts: Vec<String> = Vec::new();

    for run in READABLE_RE.find_iter(&text) {
        let cleaned = run.as_str().trim();
        if cleaned.chars().count() > 5 {
            parts.push(cleaned.to_string());
        }
    }

    // Cell values in sheet XML, e.g. <v>12.5</v> or <t>Area (ha)</t>.
    for caps in TAG_TEXT_RE.captures_iter(&text) {
        let content = caps[1].trim();
        if content.chars().count() > 2 && !NUMERIC_ONLY_RE.is_match(content) {
            parts.push(content.to_string());
        }
    }

    let mut seen = HashSet::new();
    let unique: Vec<String> = parts
        .into_iter()
        .filter(|part| seen.insert(part.clone()))
        .collect();

    let result = unique.join("\n");
    if result.is_empty() {
        FALLBACK_TEXT.to_string()
    } else {
        result
    }
}
