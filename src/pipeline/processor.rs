//! Audit orchestration: one call runs the whole pipeline.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use uuid::Uuid;

use super::extract::SourceKind;
use super::gateway::CompletionClient;
use super::report::{self, AuditReport};
use super::{budget, extract, parser, prompt, rules, AuditError};
use crate::db::repository;

/// One uploaded multipart file, as received from the client.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub bytes: Vec<u8>,
    pub declared_name: String,
    pub declared_size: usize,
}

impl UploadedDocument {
    pub fn new(declared_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let declared_size = bytes.len();
        Self {
            bytes,
            declared_name: declared_name.into(),
            declared_size,
        }
    }
}

/// What one audit run produced: the report itself, plus the stored row id
/// when persistence happened.
#[derive(Debug)]
pub struct AuditOutcome {
    pub report: AuditReport,
    pub report_id: Option<Uuid>,
}

/// Runs audits end to end against a completion backend and a report store.
pub struct AuditProcessor {
    client: Arc<dyn CompletionClient>,
    db: Arc<Mutex<Connection>>,
}

impl AuditProcessor {
    pub fn new(client: Arc<dyn CompletionClient>, db: Arc<Mutex<Connection>>) -> Self {
        Self { client, db }
    }

    /// Run one audit. Evaluation failures abort the run; persistence failures
    /// never do, they only cost the caller the stored report id.
    pub async fn run(
        &self,
        pdd: UploadedDocument,
        calculation: Option<UploadedDocument>,
        owner_id: Option<&str>,
    ) -> Result<AuditOutcome, AuditError> {
        tracing::info!(
            pdd_name = %pdd.declared_name,
            pdd_bytes = pdd.declared_size,
            has_calculation = calculation.is_some(),
            "Starting compliance audit"
        );

        let pdd_text = budget::apply(
            SourceKind::Pdd,
            extract::extract(&pdd.bytes, SourceKind::Pdd),
        );
        let calc_text = calculation.as_ref().map(|doc| {
            budget::apply(
                SourceKind::Calculation,
                extract::extract(&doc.bytes, SourceKind::Calculation),
            )
        });

        if pdd_text.truncated || calc_text.as_ref().is_some_and(|text| text.truncated) {
            tracing::warn!("Extracted text exceeded the context budget and was truncated");
        }

        let request = prompt::build_evaluation_request(rules::corpus(), &pdd_text, calc_text.as_ref());
        let reply = self.client.complete(request.system, &request.user).await?;
        let parsed = parser::parse_evaluation(&reply)?;
        let findings =
            report::validate_findings(parsed.issues, parsed.compliant_rules, rules::corpus());
        let audit = report::aggregate(parsed.project_name, parsed.summary, findings);

        tracing::info!(
            project = %audit.project_name,
            major = audit.summary.major,
            minor = audit.summary.minor,
            compliant = audit.summary.compliant,
            "Audit evaluation complete"
        );

        let report_id = match owner_id {
            Some(owner) => self.persist(owner, &audit),
            None => None,
        };

        Ok(AuditOutcome {
            report: audit,
            report_id,
        })
    }

    /// Best-effort write of a finished report and its issues.
    fn persist(&self, owner_id: &str, report: &AuditReport) -> Option<Uuid> {
        let conn = match self.db.lock() {
            Ok(conn) => conn,
            Err(_) => {
                tracing::error!("Report store lock poisoned, skipping persistence");
                return None;
            }
        };

        let report_id = match repository::insert_report(&conn, owner_id, report) {
            Ok(id) => id,
            Err(err) => {
                tracing::error!(error = %err, "Failed to save audit report");
                return None;
            }
        };

        if let Err(err) = repository::insert_issues(&conn, &report_id, &report.issues) {
            tracing::error!(error = %err, report_id = %report_id, "Failed to save audit issues");
        }

        Some(report_id)
    }
}
