//! Audit submission endpoint.

use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{owner_from_bearer, ApiContext};
use crate::pipeline::{AuditReport, UploadedDocument};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    pub success: bool,
    /// Stored row id; `null` for anonymous callers and when persistence
    /// failed.
    pub report_id: Option<Uuid>,
    pub report: AuditReport,
}

/// `POST /api/audit`: run a compliance audit on uploaded documents.
///
/// Multipart fields: `pdd` (required) and `calculation` (optional). A bearer
/// token is not required; when present it identifies the owner the report is
/// stored under.
pub async fn submit(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<AuditResponse>, ApiError> {
    let mut pdd: Option<UploadedDocument> = None;
    let mut calculation: Option<UploadedDocument> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let file_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| name.clone());

        match field.bytes().await {
            Ok(bytes) => match name.as_str() {
                "pdd" => pdd = Some(UploadedDocument::new(file_name, bytes.to_vec())),
                "calculation" => {
                    calculation = Some(UploadedDocument::new(file_name, bytes.to_vec()))
                }
                _ => {}
            },
            Err(err) => {
                tracing::warn!(field = %name, error = %err, "Failed to read multipart field");
            }
        }
    }

    let pdd = pdd.ok_or(ApiError::MissingPdd)?;
    let owner = owner_from_bearer(&headers);

    let outcome = ctx.processor.run(pdd, calculation, owner.as_deref()).await?;

    Ok(Json(AuditResponse {
        success: true,
        report_id: outcome.report_id,
        report: outcome.report,
    }))
}
