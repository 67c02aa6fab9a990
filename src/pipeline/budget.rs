//! Context budgeting for extracted document text.
//!
//! Hard per-kind character caps keep the assembled prompt inside the model
//! context window. Truncation is a blunt cut with a visible marker; no
//! attempt is made to respect sentence or token boundaries.

use super::extract::{ExtractedText, SourceKind};

pub const MAX_PDD_CHARS: usize = 25_000;
pub const MAX_CALC_CHARS: usize = 10_000;
pub const TRUNCATION_MARKER: &str = "\n[...TRUNCATED]";

/// Cap extracted text to the budget for its document kind.
pub fn apply(kind: SourceKind, content: String) -> ExtractedText {
    let (content, truncated) = truncate_chars(content, limit_for(kind));
    ExtractedText {
        content,
        source_kind: kind,
        truncated,
    }
}

pub fn limit_for(kind: SourceKind) -> usize {
    match kind {
        SourceKind::Pdd => MAX_PDD_CHARS,
        SourceKind::Calculation => MAX_CALC_CHARS,
    }
}

/// Cut at a character boundary and append the marker when over budget.
fn truncate_chars(text: String, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        None => (text, false),
        Some((cut, _)) => {
            let mut capped = text[..cut].to_string();
            capped.push_str(TRUNCATION_MARKER);
            (capped, true)
        }
    }
}
