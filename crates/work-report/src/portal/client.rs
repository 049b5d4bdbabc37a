use super::api::{
    AttendanceResponse, ChangePasswordRequest, CreateReportResponse, DepartmentsResponse,
    LoginRequest, ManagerContact, ManagerResourcesResponse, ManagersListResponse,
    MessageResponse, PasswordResetRequest, ResetPasswordRequest, SignupRequest,
    StatusOptionsResponse, TokenResponse, UserProfile, WorkReportsResponse,
};
use super::PortalError;
use crate::config::BackendConfig;
use crate::reports::aggregate::{attendance, AttendanceSummaryEntry, QuickSummary, ReportGroup};
use crate::reports::directory::DepartmentDirectory;
use crate::reports::domain::{ReportFilter, StatusCatalog, WorkReport};
use crate::reports::drafts::{NewWorkReport, WorkReportUpdate};
use chrono::NaiveDate;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use url::Url;

/// Typed client for the reporting backend. Every call carries the bearer token when one is set.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, PortalError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            token: config.api_token.clone(),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves `path` below the base URL, keeping the base's own path prefix.
    fn endpoint(&self, path: &str) -> Result<Url, PortalError> {
        let url = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&url)?)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, PortalError> {
        let url = self.endpoint(path)?;
        let mut builder = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/json");
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        Ok(builder)
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<Response, PortalError> {
        debug!(path, "sending backend request");
        let response = builder.send().await?;
        let status = response.status();
        info!(path, status = status.as_u16(), "backend responded");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_detail(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        warn!(path, status = status.as_u16(), %message, "backend request rejected");

        Err(match status {
            StatusCode::UNAUTHORIZED => PortalError::Unauthorized(message),
            StatusCode::FORBIDDEN => PortalError::Forbidden(message),
            StatusCode::NOT_FOUND => PortalError::NotFound(path.to_string()),
            _ => PortalError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        path: &str,
    ) -> Result<T, PortalError> {
        let response = self.send(builder, path).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
    ) -> Result<T, PortalError> {
        let builder = self.request(method, path)?;
        self.send_json(builder, path).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, PortalError> {
        self.call(Method::GET, path).await
    }

    async fn get_with<T, Q>(&self, path: &str, query: &Q) -> Result<T, PortalError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, path)?.query(query);
        self.send_json(builder, path).await
    }

    async fn send_body<T, B>(&self, method: Method, path: &str, body: &B) -> Result<T, PortalError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.request(method, path)?.json(body);
        self.send_json(builder, path).await
    }

    pub async fn departments(&self) -> Result<DepartmentDirectory, PortalError> {
        let response: DepartmentsResponse = self.get("departments").await?;
        Ok(response.departments)
    }

    pub async fn status_options(&self) -> Result<StatusCatalog, PortalError> {
        let response: StatusOptionsResponse = self.get("status-options").await?;
        Ok(response.status_options)
    }

    pub async fn work_reports(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<WorkReport>, PortalError> {
        let response: WorkReportsResponse =
            self.get_with("work-reports", &filter.query_pairs()).await?;
        Ok(response.reports)
    }

    pub async fn create_report(
        &self,
        report: &NewWorkReport,
    ) -> Result<CreateReportResponse, PortalError> {
        self.send_body(Method::POST, "work-reports", report).await
    }

    pub async fn update_report(
        &self,
        report_id: &str,
        update: &WorkReportUpdate,
    ) -> Result<MessageResponse, PortalError> {
        self.send_body(Method::PUT, &format!("work-reports/{report_id}"), update)
            .await
    }

    pub async fn delete_report(&self, report_id: &str) -> Result<MessageResponse, PortalError> {
        self.call(Method::DELETE, &format!("work-reports/{report_id}"))
            .await
    }

    /// Raw CSV produced by the backend for the same filters as the listing.
    pub async fn export_csv(&self, filter: &ReportFilter) -> Result<Vec<u8>, PortalError> {
        let path = "work-reports/export/csv";
        let builder = self
            .request(Method::GET, path)?
            .query(&filter.query_pairs());
        let response = self.send(builder, path).await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn manager_resources(&self) -> Result<BTreeMap<String, usize>, PortalError> {
        let response: ManagerResourcesResponse = self.get("manager-resources").await?;
        Ok(response.manager_resources)
    }

    /// Attendance for `date`, normalized so present never exceeds the manager's resources.
    pub async fn attendance_summary(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceSummaryEntry>, PortalError> {
        let response: AttendanceResponse = self
            .get_with("attendance-summary", &[("date", date.format("%Y-%m-%d").to_string())])
            .await?;
        Ok(attendance::from_backend(response.attendance_summary))
    }

    pub async fn summary_report_data(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<ReportGroup>, PortalError> {
        let query: Vec<(&str, String)> = filter
            .query_pairs()
            .into_iter()
            .filter(|(key, _)| matches!(*key, "from_date" | "to_date" | "department"))
            .collect();
        self.get_with("summary-report-data", &query).await
    }

    pub async fn user_summary_report(
        &self,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
    ) -> Result<Vec<ReportGroup>, PortalError> {
        let filter = ReportFilter {
            from_date,
            to_date,
            ..ReportFilter::default()
        };
        self.get_with("user-summary-report", &filter.query_pairs()).await
    }

    pub async fn quick_summary(&self, date: NaiveDate) -> Result<QuickSummary, PortalError> {
        let summary: QuickSummary = self
            .get_with("quick-summary", &[("date", date.format("%Y-%m-%d").to_string())])
            .await?;
        Ok(summary.clamped())
    }

    pub async fn managers_list(&self) -> Result<Vec<ManagerContact>, PortalError> {
        let response: ManagersListResponse = self.get("managers-list").await?;
        Ok(response.managers)
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<TokenResponse, PortalError> {
        self.send_body(Method::POST, "auth/login", request).await
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<TokenResponse, PortalError> {
        self.send_body(Method::POST, "auth/signup", request).await
    }

    pub async fn current_user(&self) -> Result<UserProfile, PortalError> {
        self.get("auth/me").await
    }

    pub async fn request_password_reset(
        &self,
        request: &PasswordResetRequest,
    ) -> Result<MessageResponse, PortalError> {
        self.send_body(Method::POST, "auth/request-password-reset", request)
            .await
    }

    pub async fn reset_password(
        &self,
        request: &ResetPasswordRequest,
    ) -> Result<MessageResponse, PortalError> {
        self.send_body(Method::POST, "auth/reset-password", request).await
    }

    pub async fn change_password(
        &self,
        request: &ChangePasswordRequest,
    ) -> Result<MessageResponse, PortalError> {
        self.send_body(Method::POST, "auth/change-password", request).await
    }
}

/// FastAPI-style `{"detail": ...}` bodies, falling back to the raw text.
fn error_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => match value.get("detail") {
            Some(serde_json::Value::String(detail)) => Some(detail.clone()),
            Some(other) => Some(other.to_string()),
            None => Some(trimmed.to_string()),
        },
        Err(_) => Some(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client(base: &str) -> BackendClient {
        let config = BackendConfig {
            base_url: Url::parse(base).expect("valid url"),
            api_token: None,
            timeout: Duration::from_secs(5),
        };
        BackendClient::new(&config).expect("client builds")
    }

    #[test]
    fn endpoints_keep_the_api_prefix() {
        let api = client("http://127.0.0.1:8000/api");
        assert_eq!(
            api.endpoint("work-reports/export/csv").expect("joins").as_str(),
            "http://127.0.0.1:8000/api/work-reports/export/csv"
        );

        let trailing = client("http://127.0.0.1:8000/api/");
        assert_eq!(
            trailing.endpoint("/departments").expect("joins").as_str(),
            "http://127.0.0.1:8000/api/departments"
        );
    }

    #[test]
    fn error_detail_prefers_fastapi_detail() {
        assert_eq!(
            error_detail(r#"{"detail": "Report not found"}"#).as_deref(),
            Some("Report not found")
        );
        assert_eq!(error_detail("gateway timeout").as_deref(), Some("gateway timeout"));
        assert_eq!(error_detail("  "), None);
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_request_error() {
        let api = client("http://127.0.0.1:9/api").with_token("t");
        let err = api.departments().await.expect_err("nothing listens on port 9");
        assert!(matches!(err, PortalError::Request(_)));
        assert!(!err.requires_logout());
    }
}
