//! Stored report read endpoints.
//!
//! Both endpoints require a bearer token: the token's hash is the owner id
//! reports were stored under, so a caller can only ever see their own rows.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{owner_from_bearer, ApiContext};
use crate::db::repository::{self, ReportRow};
use crate::pipeline::{Issue, ReportSummary};

/// One stored report row, as listed.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub id: Uuid,
    pub project_name: String,
    pub summary: ReportSummary,
    pub status: String,
    pub created_at: String,
}

impl From<ReportRow> for ReportView {
    fn from(row: ReportRow) -> Self {
        Self {
            id: row.id,
            project_name: row.project_name,
            summary: ReportSummary {
                major: row.major_issues_count as u32,
                minor: row.minor_issues_count as u32,
                compliant: row.compliant_count as u32,
            },
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct ReportListResponse {
    pub success: bool,
    pub reports: Vec<ReportView>,
}

#[derive(Serialize)]
pub struct ReportDetailResponse {
    pub success: bool,
    pub report: ReportDetailView,
}

#[derive(Serialize)]
pub struct ReportDetailView {
    #[serde(flatten)]
    pub report: ReportView,
    pub issues: Vec<Issue>,
}

/// `GET /api/reports`: list the caller's stored reports, newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
) -> Result<Json<ReportListResponse>, ApiError> {
    let owner = owner_from_bearer(&headers).ok_or(ApiError::Unauthorized)?;

    let conn = ctx
        .db
        .lock()
        .map_err(|_| ApiError::Internal("report store lock poisoned".into()))?;
    let reports = repository::list_reports_for_owner(&conn, &owner)?;

    Ok(Json(ReportListResponse {
        success: true,
        reports: reports.into_iter().map(ReportView::from).collect(),
    }))
}

/// `GET /api/reports/:id`: one stored report with its issues.
pub async fn detail(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportDetailResponse>, ApiError> {
    let owner = owner_from_bearer(&headers).ok_or(ApiError::Unauthorized)?;

    let conn = ctx
        .db
        .lock()
        .map_err(|_| ApiError::Internal("report store lock poisoned".into()))?;
    let row = repository::get_report(&conn, &owner, &id)?.ok_or(ApiError::NotFound)?;
    let issues = repository::issues_for_report(&conn, &id)?;

    Ok(Json(ReportDetailResponse {
        success: true,
        report: ReportDetailView {
            report: ReportView::from(row),
            issues,
        },
    }))
}
