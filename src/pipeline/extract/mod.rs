//! Best-effort text recovery from uploaded binaries.
//!
//! Neither extractor is a real format parser. Both scan the raw bytes for
//! recoverable text runs and never fail: structurally invalid input yields a
//! fixed human-readable placeholder instead of an error, so the evaluation
//! stage always has some text to work with.

pub mod pdd;
pub mod workbook;

/// Document family of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdd,
    Calculation,
}

/// Text recovered from one uploaded document, with truncation provenance.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub content: String,
    pub source_kind: SourceKind,
    pub truncated: bool,
}

/// Extraction strategy abstraction: each document kind's heuristic sits
/// behind this trait so a real format decoder can replace it without touching
/// the rest of the pipeline.
pub trait TextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> String;
}

/// Heuristic scanner for PDF-style page description binaries.
pub struct PddScanExtractor;

impl TextExtractor for PddScanExtractor {
    fn extract_text(&self, bytes: &[u8]) -> String {
        pdd::extract_text(bytes)
    }
}

/// Heuristic scanner for spreadsheet binaries.
pub struct WorkbookScanExtractor;

impl TextExtractor for WorkbookScanExtractor {
    fn extract_text(&self, bytes: &[u8]) -> String {
        workbook::extract_text(bytes)
    }
}

/// The built-in strategy for a document kind.
pub fn extractor_for(kind: SourceKind) -> &'static dyn TextExtractor {
    match kind {
        SourceKind::Pdd => &PddScanExtractor,
        SourceKind::Calculation => &WorkbookScanExtractor,
    }
}

/// Recover text from a raw upload with the default strategy for its kind.
/// Deterministic and infallible.
pub fn extract(bytes: &[u8], kind: SourceKind) -> String {
    extractor_for(kind).extract_text(bytes)
}

/// Decode bytes as latin1 so every byte maps to exactly one char and regex
/// scans can run over arbitrary binary input.
pub(crate) fn latin1_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
