use crate::infra::{deserialize_date, deserialize_optional_date, AppState};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use work_report::error::AppError;
use work_report::reports::export::{write_reports_csv, AttendanceSection, SummaryDocument};
use work_report::reports::{
    attendance_summary, group_reports, quick_summary, render_groups, AttendanceSummaryEntry,
    ExportFormat, GroupOrder, QuickSummary, ReportBundle, ReportFilter, ReportGroup,
    ReportGrouper, ReportScope, TabularReport, WorkReport,
};

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryRequest {
    #[serde(flatten)]
    pub(crate) bundle: ReportBundle,
    #[serde(default)]
    pub(crate) filter: ReportFilter,
    #[serde(default)]
    pub(crate) sorted: bool,
    /// Restricts the reports to what this account may see.
    #[serde(default)]
    pub(crate) viewer: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SummaryResponse {
    pub(crate) groups: Vec<ReportGroup>,
    pub(crate) table: TabularReport,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuickSummaryRequest {
    #[serde(flatten)]
    pub(crate) bundle: ReportBundle,
    #[serde(deserialize_with = "deserialize_date")]
    pub(crate) date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuickSummaryResponse {
    pub(crate) quick_summary: QuickSummary,
    pub(crate) attendance: Vec<AttendanceSummaryEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExportRequest {
    #[serde(flatten)]
    pub(crate) bundle: ReportBundle,
    #[serde(default)]
    pub(crate) filter: ReportFilter,
    /// Date stamped into the attachment name; defaults to today.
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) date: Option<NaiveDate>,
    /// Attendance date for the PDF; defaults to `date`.
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) attendance_date: Option<NaiveDate>,
}

impl ExportRequest {
    fn filtered(&self) -> (ReportFilter, Vec<WorkReport>) {
        let filter = self.filter.clone().normalized();
        let reports = self.bundle.filtered(&filter);
        (filter, reports)
    }

    fn export_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }

    fn attendance_date(&self) -> NaiveDate {
        self.attendance_date.unwrap_or_else(|| self.export_date())
    }
}

pub(crate) fn portal_routes() -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/reports/summary",
            axum::routing::post(summary_endpoint),
        )
        .route(
            "/api/v1/reports/quick-summary",
            axum::routing::post(quick_summary_endpoint),
        )
        .route(
            "/api/v1/reports/export/csv",
            axum::routing::post(export_csv_endpoint),
        )
        .route(
            "/api/v1/reports/export/pdf",
            axum::routing::post(export_pdf_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn summary_endpoint(Json(payload): Json<SummaryRequest>) -> Json<SummaryResponse> {
    let SummaryRequest {
        bundle,
        filter,
        sorted,
        viewer,
    } = payload;

    let catalog = bundle.catalog();
    let mut reports = bundle.filtered(&filter.normalized());
    if let Some(viewer) = viewer {
        reports = ReportScope::for_viewer(&viewer, &bundle.departments).visible(&reports);
    }

    let order = if sorted {
        GroupOrder::Sorted
    } else {
        GroupOrder::Encounter
    };
    let groups = ReportGrouper::new(&bundle.departments, &catalog)
        .order(order)
        .group(&reports);
    let table = render_groups(&groups, &catalog);

    Json(SummaryResponse { groups, table })
}

pub(crate) async fn quick_summary_endpoint(
    Json(payload): Json<QuickSummaryRequest>,
) -> Json<QuickSummaryResponse> {
    let QuickSummaryRequest { bundle, date } = payload;

    Json(QuickSummaryResponse {
        quick_summary: quick_summary(date, &bundle.reports, &bundle.departments),
        attendance: attendance_summary(date, &bundle.reports, &bundle.departments),
    })
}

pub(crate) async fn export_csv_endpoint(
    Json(payload): Json<ExportRequest>,
) -> Result<Response, AppError> {
    let (_, reports) = payload.filtered();
    let bytes = write_reports_csv(&reports)?;
    info!(reports = reports.len(), bytes = bytes.len(), "csv export served");
    Ok(attachment(ExportFormat::Csv, payload.export_date(), bytes))
}

pub(crate) async fn export_pdf_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ExportRequest>,
) -> Result<Response, AppError> {
    let (filter, reports) = payload.filtered();
    let catalog = payload.bundle.catalog();
    let groups = group_reports(&reports, &payload.bundle.departments, &catalog);
    let table = render_groups(&groups, &catalog);
    let day = payload.attendance_date();
    let attendance = AttendanceSection {
        date: day,
        entries: attendance_summary(day, &payload.bundle.reports, &payload.bundle.departments),
    };

    let document = SummaryDocument::new(&state.export, table, Local::now().naive_local())
        .with_filter_description(filter.describe())
        .with_attendance(Some(attendance));
    let output = document.render()?;
    info!(pages = output.page_count, bytes = output.bytes.len(), "pdf export served");

    Ok(attachment(ExportFormat::Pdf, payload.export_date(), output.bytes))
}

fn attachment(format: ExportFormat, date: NaiveDate, bytes: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", format.file_name(date));
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;
    use work_report::config::ExportConfig;

    fn state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
            export: Arc::new(ExportConfig::default()),
        }
    }

    fn router() -> axum::Router {
        portal_routes().layer(Extension(state(true)))
    }

    fn bundle() -> Value {
        json!({
            "departments": {
                "Eng": {"Core": [
                    {"Name": "M1", "Designation": "Reporting manager", "Reviewer": "Director", "Email ID": "m1@example.com"},
                    {"Name": "E1", "Designation": "Employee", "Reviewer": "M1", "Email ID": "e1@example.com"},
                    {"Name": "E2", "Designation": "Employee", "Reviewer": "M1", "Email ID": "e2@example.com"}
                ]},
                "Ops": {"Field": [
                    {"Name": "M2", "Designation": "Reporting manager", "Email ID": "m2@example.com"},
                    {"Name": "E4", "Designation": "Employee", "Reviewer": "M2", "Email ID": "e4@example.com"}
                ]}
            },
            "status_options": ["WIP", "Completed", "Yet to Start", "Delayed"],
            "reports": [
                {"id": "r1", "employee_name": "E1", "employee_email": "e1@example.com", "department": "Eng", "team": "Core",
                 "reporting_manager": "M1", "date": "2025-03-07",
                 "tasks": [{"details": "Fix login", "status": "Completed"}, {"details": "Review PR", "status": "WIP"}]},
                {"id": "r2", "employee_name": "E4", "employee_email": "e4@example.com", "department": "Ops", "team": "Field",
                 "reporting_manager": "M2", "date": "2025-03-07", "tasks": []}
            ]
        })
    }

    fn with_fields(mut body: Value, fields: Value) -> Value {
        if let (Some(target), Some(extra)) = (body.as_object_mut(), fields.as_object()) {
            for (key, value) in extra {
                target.insert(key.clone(), value.clone());
            }
        }
        body
    }

    async fn post(router: axum::Router, uri: &str, body: &Value) -> Response {
        router
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
                    .expect("request builds"),
            )
            .await
            .expect("router dispatch")
    }

    async fn read_json(response: Response) -> Value {
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&body).expect("json")
    }

    #[tokio::test]
    async fn summary_returns_groups_and_row_span_table() {
        let response = post(router(), "/api/v1/reports/summary", &bundle()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let payload = read_json(response).await;
        let groups = payload["groups"].as_array().expect("groups");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0]["no_of_resource"], 3);
        assert_eq!(groups[0]["reviewer"], "Director");
        assert_eq!(groups[1]["reviewer"], "N/A");

        let rows = payload["table"]["rows"].as_array().expect("rows");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["group_cells"][0]["row_span"], 2);
        assert!(rows[1].get("group_cells").is_none());
        assert_eq!(rows[2]["task"]["kind"], "no_tasks");
    }

    #[tokio::test]
    async fn summary_honours_filter_and_viewer_scope() {
        let filtered = with_fields(bundle(), json!({"filter": {"department": "Ops"}}));
        let payload = read_json(post(router(), "/api/v1/reports/summary", &filtered).await).await;
        assert_eq!(payload["groups"].as_array().map(Vec::len), Some(1));
        assert_eq!(payload["groups"][0]["department"], "Ops");

        let scoped = with_fields(bundle(), json!({"viewer": "e1@example.com"}));
        let payload = read_json(post(router(), "/api/v1/reports/summary", &scoped).await).await;
        assert_eq!(payload["groups"].as_array().map(Vec::len), Some(1));
        assert_eq!(payload["groups"][0]["department"], "Eng");
    }

    #[tokio::test]
    async fn quick_summary_reports_counts_and_attendance() {
        let body = with_fields(bundle(), json!({"date": "2025-03-07"}));
        let response = post(router(), "/api/v1/reports/quick-summary", &body).await;
        assert_eq!(response.status(), StatusCode::OK);

        let payload = read_json(response).await;
        let summary = payload["quick_summary"]["summary"].as_array().expect("summary");
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0]["team"], "Core");
        assert_eq!(summary[0]["reported_count"], 1);
        assert_eq!(summary[0]["total_employees"], 3);

        let attendance = payload["attendance"].as_array().expect("attendance");
        assert_eq!(attendance[0]["manager"], "M1");
        assert_eq!(attendance[0]["present"], 1);
        assert_eq!(attendance[0]["absent"], 1);
    }

    #[tokio::test]
    async fn quick_summary_rejects_malformed_date() {
        let body = with_fields(bundle(), json!({"date": "07/03/2025"}));
        let response = post(router(), "/api/v1/reports/quick-summary", &body).await;
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn csv_export_is_a_dated_attachment() {
        let body = with_fields(bundle(), json!({"date": "2025-03-07"}));
        let response = post(router(), "/api/v1/reports/export/csv", &body).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"work_reports_2025-03-07.csv\""
        );

        let bytes = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let text = String::from_utf8(bytes.to_vec()).expect("utf-8 csv");
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("Fix login"));
    }

    async fn pdf_text(body: &Value) -> String {
        let response = post(router(), "/api/v1/reports/export/pdf", body).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");

        let bytes = to_bytes(response.into_body(), 4 * 1024 * 1024)
            .await
            .expect("body");
        assert!(bytes.starts_with(b"%PDF-"));
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[tokio::test]
    async fn pdf_export_carries_attendance_for_the_export_date() {
        let text = pdf_text(&with_fields(bundle(), json!({"date": "2025-03-07"}))).await;
        assert!(text.contains("(Attendance Summary \\(2025-03-07\\)) Tj"));
        assert!(text.contains("(50.0%) Tj"));
    }

    #[tokio::test]
    async fn pdf_attendance_date_overrides_the_export_date() {
        let body = with_fields(
            bundle(),
            json!({"date": "2025-03-07", "attendance_date": "2025-03-06"}),
        );
        let text = pdf_text(&body).await;
        assert!(text.contains("(Attendance Summary \\(2025-03-06\\)) Tj"));
        assert!(!text.contains("2025-03-07\\)"));
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let response = portal_routes()
            .layer(Extension(state(false)))
            .oneshot(
                Request::get("/ready")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
