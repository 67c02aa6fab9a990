//! Report domain types, post-parse validation, and summary aggregation.
//!
//! Validation sits between the response parser and report assembly: it drops
//! findings that violate the rule corpus (unknown rule numbers, compliant
//! entries without evidence) so that every report the service returns or
//! persists is internally consistent.

use serde::{Deserialize, Deserializer, Serialize};

use super::rules::RuleCorpus;
use crate::db::DatabaseError;

/// Issue severity as classified by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Major,
    Minor,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            _ => Err(DatabaseError::InvalidEnum {
                field: "Severity".into(),
                value: s.into(),
            }),
        }
    }
}

/// Rule area an issue belongs to. Unknown or missing labels collapse to
/// `General` rather than rejecting the finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Calculation,
    Parameters,
    Eligibility,
    Monitoring,
    Documentation,
    #[default]
    General,
}

impl IssueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calculation => "calculation",
            Self::Parameters => "parameters",
            Self::Eligibility => "eligibility",
            Self::Monitoring => "monitoring",
            Self::Documentation => "documentation",
            Self::General => "general",
        }
    }

    fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "calculation" => Self::Calculation,
            "parameters" => Self::Parameters,
            "eligibility" => Self::Eligibility,
            "monitoring" => Self::Monitoring,
            "documentation" => Self::Documentation,
            _ => Self::General,
        }
    }
}

impl<'de> Deserialize<'de> for IssueCategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(value.as_str().map(Self::from_label).unwrap_or_default())
    }
}

impl std::str::FromStr for IssueCategory {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "calculation" => Ok(Self::Calculation),
            "parameters" => Ok(Self::Parameters),
            "eligibility" => Ok(Self::Eligibility),
            "monitoring" => Ok(Self::Monitoring),
            "documentation" => Ok(Self::Documentation),
            "general" => Ok(Self::General),
            _ => Err(DatabaseError::InvalidEnum {
                field: "IssueCategory".into(),
                value: s.into(),
            }),
        }
    }
}

/// Per-rule verdict the evaluator may attach to an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueStatus {
    #[serde(rename = "FAIL")]
    Fail,
    #[serde(rename = "NOT_FOUND")]
    NotFound,
}

/// Lenient decode for the optional issue status: anything other than the two
/// known verdicts is treated as absent.
fn lenient_status<'de, D>(deserializer: D) -> Result<Option<IssueStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value.as_str() {
        Some("FAIL") => Some(IssueStatus::Fail),
        Some("NOT_FOUND") => Some(IssueStatus::NotFound),
        _ => None,
    })
}

/// A single non-compliance finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub severity: Severity,
    #[serde(default)]
    pub category: IssueCategory,
    pub title: String,
    #[serde(default)]
    pub section: Option<String>,
    pub description: String,
    #[serde(default)]
    pub suggested_fix: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<IssueStatus>,
}

/// A rule the evaluator found direct textual evidence for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompliantRule {
    pub rule_number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub evidence: String,
}

/// Summary counts, always derived from the finding sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub major: u32,
    pub minor: u32,
    pub compliant: u32,
}

/// The client-facing compliance report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub project_name: String,
    pub summary: ReportSummary,
    pub issues: Vec<Issue>,
    pub compliant_rules: Vec<CompliantRule>,
    pub overall_summary: String,
}

/// Findings that survived validation, plus what was dropped and why.
#[derive(Debug, Clone)]
pub struct ValidatedFindings {
    pub issues: Vec<Issue>,
    pub compliant_rules: Vec<CompliantRule>,
    pub warnings: Vec<String>,
}

/// Validate decoded findings against the rule corpus.
///
/// Compliant entries must reference a rule that exists in the corpus and carry
/// non-empty evidence text; anything else is removed with a warning. Issues
/// arrive already structurally valid from the parser and pass through.
pub fn validate_findings(
    issues: Vec<Issue>,
    mut compliant_rules: Vec<CompliantRule>,
    corpus: &RuleCorpus,
) -> ValidatedFindings {
    let mut warnings = Vec::new();

    compliant_rules.retain(|entry| {
        if !corpus.contains(entry.rule_number) {
            warnings.push(format!(
                "Compliant entry for rule {} outside the corpus removed",
                entry.rule_number
            ));
            return false;
        }
        if entry.evidence.trim().is_empty() {
            warnings.push(format!(
                "Compliant entry for rule {} with no evidence removed",
                entry.rule_number
            ));
            return false;
        }
        true
    });

    if !warnings.is_empty() {
        tracing::warn!(
            warning_count = warnings.len(),
            "Finding validation warnings detected"
        );
    }

    ValidatedFindings {
        issues,
        compliant_rules,
        warnings,
    }
}

/// Assemble the final report from validated findings.
///
/// Summary counts come from counting the sequences here, never from anything
/// the evaluator claims about its own output.
pub fn aggregate(
    project_name: String,
    overall_summary: String,
    findings: ValidatedFindings,
) -> AuditReport {
    let major = findings
        .issues
        .iter()
        .filter(|i| i.severity == Severity::Major)
        .count() as u32;
    let minor = findings
        .issues
        .iter()
        .filter(|i| i.severity == Severity::Minor)
        .count() as u32;
    let compliant = findings.compliant_rules.len() as u32;

    let project_name = if project_name.trim().is_empty() {
        "Unknown Project".to_string()
    } else {
        project_name
    };

    AuditReport {
        project_name,
        summary: ReportSummary {
            major,
            minor,
            compliant,
        },
        issues: findings.issues,
        compliant_rules: findings.compliant_rules,
        overall_summary,
    }
}
