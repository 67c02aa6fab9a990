//! Audit API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Hard cap on one multipart submission (PDD plus calculation sheet).
const MAX_UPLOAD_BYTES: usize = 30 * 1024 * 1024;

/// Build the audit API router.
///
/// CORS is wide open: callers are identified by bearer token, never by
/// origin.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn audit_api_router(ctx: ApiContext) -> Router {
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/audit", post(endpoints::audit::submit))
        .route("/reports", get(endpoints::reports::list))
        .route("/reports/:id", get(endpoints::reports::detail))
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::api::types::hash_token;
    use crate::db::repository;
    use crate::db::sqlite::open_memory_database;
    use crate::pipeline::gateway::MockCompletionClient;
    use crate::pipeline::AuditProcessor;

    const SCENARIO_REPLY: &str = r#"{
        "projectName": "AWD Tarlac Pilot",
        "issues": [
            {"severity": "major", "category": "calculation", "title": "Wrong baseline factor",
             "section": "Annex 2", "description": "Sheet uses 1.45 instead of 1.30.",
             "suggestedFix": "Use 1.30.", "status": "FAIL"},
            {"severity": "major", "category": "parameters", "title": "SDWAT missing",
             "section": null, "description": "No soil drying threshold stated. NOT FOUND.",
             "suggestedFix": null, "status": "NOT_FOUND"},
            {"severity": "minor", "category": "monitoring", "title": "Log frequency unstated",
             "section": "Section 6", "description": "Monitoring interval is not given.",
             "suggestedFix": "State the interval.", "status": "NOT_FOUND"}
        ],
        "compliantRules": [
            {"ruleNumber": 1, "title": "Applicability", "evidence": "AWD on irrigated paddies."},
            {"ruleNumber": 4, "title": "Boundary", "evidence": "Boundary covers all plots."},
            {"ruleNumber": 9, "title": "Leakage", "evidence": "No displacement of flooding."}
        ],
        "summary": "Two major issues, one minor, three rules compliant."
    }"#;

    const PDD_BYTES: &[u8] = b"(AWD rice paddies project design) Tj";
    const CALC_BYTES: &[u8] = b"<v>Baseline factor 1.30</v>";
    const BOUNDARY: &str = "carbaudit-test-boundary";

    struct TestApp {
        app: Router,
        mock: Arc<MockCompletionClient>,
        db: Arc<Mutex<rusqlite::Connection>>,
    }

    fn test_app_with(mock: MockCompletionClient) -> TestApp {
        let mock = Arc::new(mock);
        let db = Arc::new(Mutex::new(open_memory_database().unwrap()));
        let processor = Arc::new(AuditProcessor::new(mock.clone(), db.clone()));
        let app = audit_api_router(ApiContext::new(processor, db.clone()));
        TestApp { app, mock, db }
    }

    fn test_app() -> TestApp {
        test_app_with(MockCompletionClient::new(SCENARIO_REPLY))
    }

    fn multipart_body(parts: &[(&str, &str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, filename, bytes) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn audit_request(parts: &[(&str, &str, &[u8])], token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/audit")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder.body(Body::from(multipart_body(parts))).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn response_json(response: axum::http::Response<Body>) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn report_count(db: &Arc<Mutex<rusqlite::Connection>>) -> i64 {
        let conn = db.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM audit_reports", [], |row| row.get(0))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let t = test_app();
        let response = t.app.oneshot(get_request("/api/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["status"], "ok");
        assert!(!json["version"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_pdd_returns_400_without_contacting_the_gateway() {
        let t = test_app();
        let req = audit_request(&[("calculation", "calc.xlsx", CALC_BYTES)], None);
        let response = t.app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "PDD file is required");
        assert_eq!(t.mock.call_count(), 0);
    }

    #[tokio::test]
    async fn anonymous_audit_returns_report_with_null_id() {
        let t = test_app();
        let req = audit_request(&[("pdd", "pdd.pdf", PDD_BYTES)], None);
        let response = t.app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["success"], true);
        assert!(json["reportId"].is_null());
        assert_eq!(json["report"]["projectName"], "AWD Tarlac Pilot");
        assert_eq!(json["report"]["summary"]["major"], 2);
        assert_eq!(json["report"]["summary"]["minor"], 1);
        assert_eq!(json["report"]["summary"]["compliant"], 3);
        assert_eq!(json["report"]["issues"].as_array().unwrap().len(), 3);
        assert_eq!(report_count(&t.db), 0);
    }

    #[tokio::test]
    async fn authenticated_audit_stores_the_report_under_the_token_owner() {
        let t = test_app();
        let req = audit_request(
            &[
                ("pdd", "pdd.pdf", PDD_BYTES),
                ("calculation", "calc.xlsx", CALC_BYTES),
            ],
            Some("audit-token"),
        );
        let response = t.app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        let report_id = json["reportId"].as_str().expect("stored id").to_string();

        let conn = t.db.lock().unwrap();
        let rows = repository::list_reports_for_owner(&conn, &hash_token("audit-token")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id.to_string(), report_id);
        assert_eq!(rows[0].major_issues_count, 2);
        assert_eq!(rows[0].minor_issues_count, 1);
        assert_eq!(rows[0].compliant_count, 3);

        let issues = repository::issues_for_report(&conn, &rows[0].id).unwrap();
        assert_eq!(issues.len(), 3);
    }

    #[tokio::test]
    async fn gateway_failure_returns_502_and_stores_nothing() {
        let t = test_app_with(MockCompletionClient::failing(500));
        let req = audit_request(&[("pdd", "pdd.pdf", PDD_BYTES)], Some("audit-token"));
        let response = t.app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = response_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("AI gateway call failed [500]"));
        assert_eq!(report_count(&t.db), 0);
    }

    #[tokio::test]
    async fn unparseable_reply_returns_502() {
        let t = test_app_with(MockCompletionClient::new("no JSON here, sorry"));
        let req = audit_request(&[("pdd", "pdd.pdf", PDD_BYTES)], None);
        let response = t.app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = response_json(response).await;
        assert_eq!(json["error"], "Failed to parse AI evaluation response");
    }

    #[tokio::test]
    async fn reports_require_a_bearer_token() {
        let t = test_app();
        let list = t
            .app
            .clone()
            .oneshot(get_request("/api/reports", None))
            .await
            .unwrap();
        assert_eq!(list.status(), StatusCode::UNAUTHORIZED);

        let detail_uri = format!("/api/reports/{}", uuid::Uuid::new_v4());
        let detail = t
            .app
            .oneshot(get_request(&detail_uri, None))
            .await
            .unwrap();
        assert_eq!(detail.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn reports_list_is_scoped_to_the_caller() {
        let t = test_app();
        for token in ["token-a", "token-b"] {
            let response = t
                .app
                .clone()
                .oneshot(audit_request(&[("pdd", "a.pdf", PDD_BYTES)], Some(token)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = t
            .app
            .oneshot(get_request("/api/reports", Some("token-a")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["success"], true);
        let reports = json["reports"].as_array().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0]["projectName"], "AWD Tarlac Pilot");
        assert_eq!(reports[0]["summary"]["compliant"], 3);
        assert_eq!(reports[0]["status"], "completed");
    }

    #[tokio::test]
    async fn report_detail_returns_issues_and_is_owner_scoped() {
        let t = test_app();
        let submit = t
            .app
            .clone()
            .oneshot(audit_request(&[("pdd", "a.pdf", PDD_BYTES)], Some("token-a")))
            .await
            .unwrap();
        let submit_json = response_json(submit).await;
        let id = submit_json["reportId"].as_str().unwrap().to_string();

        let response = t
            .app
            .clone()
            .oneshot(get_request(&format!("/api/reports/{id}"), Some("token-a")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["report"]["id"], id.as_str());
        assert_eq!(json["report"]["issues"].as_array().unwrap().len(), 3);
        assert_eq!(json["report"]["projectName"], "AWD Tarlac Pilot");

        let other = t
            .app
            .oneshot(get_request(&format!("/api/reports/{id}"), Some("token-b")))
            .await
            .unwrap();
        assert_eq!(other.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_report_id_returns_404() {
        let t = test_app();
        let uri = format!("/api/reports/{}", uuid::Uuid::new_v4());
        let response = t.app.oneshot(get_request(&uri, Some("token-a"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let t = test_app();
        let response = t
            .app
            .oneshot(get_request("/api/nonexistent", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
