//! The compliance audit pipeline.
//!
//! Stages run strictly in order: extract, budget, prompt assembly, gateway
//! evaluation, lenient parse, corpus validation, aggregation. Every stage is
//! a pure function except the gateway call; the processor wires them together
//! and adds best-effort persistence at the end.

pub mod budget;
pub mod extract;
pub mod gateway;
pub mod parser;
pub mod processor;
pub mod prompt;
pub mod report;
pub mod rules;

pub use extract::{ExtractedText, SourceKind};
pub use gateway::{AiGatewayClient, CompletionClient, GatewayError};
pub use parser::{ParseError, ParsedEvaluation};
pub use processor::{AuditOutcome, AuditProcessor, UploadedDocument};
pub use report::{AuditReport, CompliantRule, Issue, ReportSummary, Severity};
pub use rules::RuleCorpus;

use thiserror::Error;

/// Failures that abort an audit run.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
