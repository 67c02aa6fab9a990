use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::DatabaseError;
use crate::pipeline::report::{AuditReport, Issue, IssueCategory, Severity};

/// One stored aggregate report row.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub id: Uuid,
    pub owner_id: String,
    pub project_name: String,
    pub major_issues_count: i64,
    pub minor_issues_count: i64,
    pub compliant_count: i64,
    pub status: String,
    pub created_at: String,
}

/// Insert the aggregate report row and return its generated id.
///
/// Reports are append-only: a re-run of the same documents always creates a
/// new row rather than updating an old one.
pub fn insert_report(
    conn: &Connection,
    owner_id: &str,
    report: &AuditReport,
) -> Result<Uuid, DatabaseError> {
    let id = Uuid::new_v4();
    let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

    conn.execute(
        "INSERT INTO audit_reports (id, owner_id, project_name, major_issues_count,
         minor_issues_count, compliant_count, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id.to_string(),
            owner_id,
            report.project_name,
            i64::from(report.summary.major),
            i64::from(report.summary.minor),
            i64::from(report.summary.compliant),
            "completed",
            created_at,
        ],
    )?;

    Ok(id)
}

/// Insert one row per issue, all referencing the given report.
pub fn insert_issues(
    conn: &Connection,
    report_id: &Uuid,
    issues: &[Issue],
) -> Result<(), DatabaseError> {
    let mut stmt = conn.prepare(
        "INSERT INTO audit_issues (id, report_id, severity, category, title, section,
         description, suggested_fix)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;

    for issue in issues {
        stmt.execute(params![
            Uuid::new_v4().to_string(),
            report_id.to_string(),
            issue.severity.as_str(),
            issue.category.as_str(),
            issue.title,
            issue.section,
            issue.description,
            issue.suggested_fix,
        ])?;
    }

    Ok(())
}

/// List an owner's reports, newest first.
pub fn list_reports_for_owner(
    conn: &Connection,
    owner_id: &str,
) -> Result<Vec<ReportRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, project_name, major_issues_count, minor_issues_count,
         compliant_count, status, created_at
         FROM audit_reports WHERE owner_id = ?1 ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map(params![owner_id], |row| {
        Ok(RawReportRow {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            project_name: row.get(2)?,
            major_issues_count: row.get(3)?,
            minor_issues_count: row.get(4)?,
            compliant_count: row.get(5)?,
            status: row.get(6)?,
            created_at: row.get(7)?,
        })
    })?;

    let mut reports = Vec::new();
    for raw in rows {
        reports.push(report_from_row(raw?)?);
    }
    Ok(reports)
}

/// Fetch one report by id, scoped to its owner.
pub fn get_report(
    conn: &Connection,
    owner_id: &str,
    id: &Uuid,
) -> Result<Option<ReportRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, project_name, major_issues_count, minor_issues_count,
         compliant_count, status, created_at
         FROM audit_reports WHERE id = ?1 AND owner_id = ?2",
    )?;

    let result = stmt.query_row(params![id.to_string(), owner_id], |row| {
        Ok(RawReportRow {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            project_name: row.get(2)?,
            major_issues_count: row.get(3)?,
            minor_issues_count: row.get(4)?,
            compliant_count: row.get(5)?,
            status: row.get(6)?,
            created_at: row.get(7)?,
        })
    });

    match result {
        Ok(raw) => Ok(Some(report_from_row(raw)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Load the issues stored for a report.
///
/// The per-issue status verdict is not persisted, so reconstructed issues
/// always carry an absent status.
pub fn issues_for_report(
    conn: &Connection,
    report_id: &Uuid,
) -> Result<Vec<Issue>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT severity, category, title, section, description, suggested_fix
         FROM audit_issues WHERE report_id = ?1",
    )?;

    let rows = stmt.query_map(params![report_id.to_string()], |row| {
        Ok(RawIssueRow {
            severity: row.get(0)?,
            category: row.get(1)?,
            title: row.get(2)?,
            section: row.get(3)?,
            description: row.get(4)?,
            suggested_fix: row.get(5)?,
        })
    })?;

    let mut issues = Vec::new();
    for raw in rows {
        issues.push(issue_from_row(raw?)?);
    }
    Ok(issues)
}

// Internal row types for column mapping

struct RawReportRow {
    id: String,
    owner_id: String,
    project_name: String,
    major_issues_count: i64,
    minor_issues_count: i64,
    compliant_count: i64,
    status: String,
    created_at: String,
}

struct RawIssueRow {
    severity: String,
    category: String,
    title: String,
    section: Option<String>,
    description: String,
    suggested_fix: Option<String>,
}

fn report_from_row(raw: RawReportRow) -> Result<ReportRow, DatabaseError> {
    Ok(ReportRow {
        id: Uuid::parse_str(&raw.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        owner_id: raw.owner_id,
        project_name: raw.project_name,
        major_issues_count: raw.major_issues_count,
        minor_issues_count: raw.minor_issues_count,
        compliant_count: raw.compliant_count,
        status: raw.status,
        created_at: raw.created_at,
    })
}

fn issue_from_row(raw: RawIssueRow) -> Result<Issue, DatabaseError> {
    Ok(Issue {
        severity: Severity::from_str(&raw.severity)?,
        category: IssueCategory::from_str(&raw.category)?,
        title: raw.title,
        section: raw.section,
        description: raw.description,
        suggested_fix: raw.suggested_fix,
        status: None,
    })
}
