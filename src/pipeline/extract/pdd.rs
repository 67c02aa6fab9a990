//! Heuristic text recovery from PDF-style page description binaries.
//!
//! Four scan passes over the latin1-decoded bytes, in order: uncompressed
//! stream payloads, literal `Tj` show operators, `TJ` array show operators,
//! and finally any long printable runs not already collected. Compressed
//! streams and image-only documents defeat all four, which is why the
//! placeholder text exists.

use std::sync::LazyLock;

use regex::Regex;

use super::latin1_string;

const FALLBACK_TEXT: &str =
    "Unable to extract text from PDF. The document may be image-based or encrypted.";

/// Minimum cleaned length for a stream payload to count as readable.
const MIN_STREAM_CHARS: usize = 20;

static STREAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)stream\s*\n(.*?)endstream").unwrap());
static TEXT_SHOW_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^)]+)\)\s*Tj").unwrap());
static ARRAY_SHOW_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\s*TJ").unwrap());
static FRAGMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^)]*)\)").unwrap());
static PLAIN_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[A-Za-z][A-Za-z0-9\s.,;:!?'"()\-/%=+]{30,}"#).unwrap());

/// Scan raw PDF bytes for recoverable text. Never fails; returns a fixed
/// placeholder when nothing readable is found.
pub fn extract_text(bytes: &[u8]) -> String {
    let text = latin1_string(bytes);
    let mut parts: Vec<String> = Vec::new();

    for caps in STREAM_RE.captures_iter(&text) {
        let readable = printable_run(&caps[1]);
        if readable.len() > MIN_STREAM_CHARS {
            parts.push(readable);
        }
    }

    for caps in TEXT_SHOW_RE.captures_iter(&text) {
        parts.push(caps[1].to_string());
    }

    for caps in ARRAY_SHOW_RE.captures_iter(&text) {
        let fragments: Vec<String> = FRAGMENT_RE
            .captures_iter(&caps[1])
            .map(|frag| frag[1].to_string())
            .collect();
        if !fragments.is_empty() {
            parts.push(fragments.concat());
        }
    }

    for run in PLAIN_RUN_RE.find_iter(&text) {
        let run = run.as_str();
        if !parts.iter().any(|part| part == run) {
            parts.push(run.to_string());
        }
    }

    let result = parts.join("\n\n");
    if result.is_empty() {
        FALLBACK_TEXT.to_string()
    } else {
        result
    }
}

/// Replace non-printable bytes with spaces and collapse whitespace runs.
fn printable_run(content: &str) -> String {
    let spaced: String = content
        .chars()
        .map(|ch| match ch {
            '\x20'..='\x7e' | '\n' | '\r' | '\t' => ch,
            _ => ' ',
        })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
