use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use work_report::portal::api::TokenResponse;
use work_report::portal::{FetchOutcome, PortalContext, PortalError, ReportFetcher, ReportSource};
use work_report::reports::{
    AttendanceSummaryEntry, DepartmentDirectory, QuickSummary, ReportFilter, StatusCatalog,
    Task, WorkReport,
};

/// Source whose responses arrive after a per-call delay, echoing the requested department.
#[derive(Default)]
struct ScriptedSource {
    delays: Mutex<Vec<Duration>>,
    failures: Mutex<Vec<PortalError>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn with_delays(delays: &[u64]) -> Self {
        Self {
            delays: Mutex::new(delays.iter().map(|ms| Duration::from_millis(*ms)).collect()),
            ..Self::default()
        }
    }

    fn fail_next(&self, err: PortalError) {
        self.failures.lock().expect("failures lock").push(err);
    }

    fn next_delay(&self) -> Duration {
        let mut delays = self.delays.lock().expect("delays lock");
        if delays.is_empty() {
            Duration::ZERO
        } else {
            delays.remove(0)
        }
    }
}

fn report(department: &str) -> WorkReport {
    WorkReport {
        id: format!("r-{department}"),
        employee_name: "Asha".to_string(),
        employee_email: Some("asha@example.com".to_string()),
        department: department.to_string(),
        team: "Core".to_string(),
        reporting_manager: "Lead".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 3, 7).expect("valid date"),
        tasks: vec![Task::new("Work", "WIP")],
        last_modified_by: None,
    }
}

#[async_trait]
impl ReportSource for ScriptedSource {
    async fn departments(&self) -> Result<DepartmentDirectory, PortalError> {
        Ok(DepartmentDirectory::default())
    }

    async fn status_options(&self) -> Result<StatusCatalog, PortalError> {
        Ok(StatusCatalog::standard())
    }

    async fn reports(&self, filter: &ReportFilter) -> Result<Vec<WorkReport>, PortalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.next_delay();
        let failure = self.failures.lock().expect("failures lock").pop();
        tokio::time::sleep(delay).await;
        match failure {
            Some(err) => Err(err),
            None => Ok(vec![report(filter.department.as_deref().unwrap_or("All"))]),
        }
    }

    async fn quick_summary(&self, date: NaiveDate) -> Result<QuickSummary, PortalError> {
        tokio::time::sleep(self.next_delay()).await;
        Ok(QuickSummary {
            date: Some(date),
            ..QuickSummary::default()
        })
    }

    async fn attendance(
        &self,
        _date: NaiveDate,
    ) -> Result<Vec<AttendanceSummaryEntry>, PortalError> {
        Ok(vec![AttendanceSummaryEntry::from_counts("Lead", 2, 1)])
    }
}

fn department(name: &str) -> ReportFilter {
    ReportFilter {
        department: Some(name.to_string()),
        ..ReportFilter::default()
    }
}

fn signed_in_context() -> Arc<PortalContext> {
    let response: TokenResponse = serde_json::from_value(serde_json::json!({
        "access_token": "tok",
        "user": {"id": "u1", "name": "Asha", "email": "asha@example.com", "role": "manager"}
    }))
    .expect("token parses");
    let context = Arc::new(PortalContext::new());
    context.login(response);
    context
}

fn applied_department(fetcher: &ReportFetcher<ScriptedSource>) -> Option<String> {
    fetcher
        .reports()
        .value()
        .and_then(|reports| reports.first().map(|report| report.department.clone()))
}

#[tokio::test]
async fn slow_earlier_response_does_not_overwrite_newer_one() {
    let fetcher = ReportFetcher::new(ScriptedSource::with_delays(&[120, 10]));

    let (first, second) = tokio::join!(
        fetcher.fetch_reports(department("Engineering")),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            fetcher.fetch_reports(department("Operations")).await
        }
    );

    assert!(matches!(first, FetchOutcome::Superseded));
    assert!(second.is_applied());
    assert_eq!(applied_department(&fetcher).as_deref(), Some("Operations"));
    assert_eq!(fetcher.source().calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn in_order_completion_applies_each_response() {
    let fetcher = ReportFetcher::new(ScriptedSource::default());

    assert!(fetcher.fetch_reports(department("Engineering")).await.is_applied());
    assert_eq!(applied_department(&fetcher).as_deref(), Some("Engineering"));

    assert!(fetcher.fetch_reports(department("All Departments")).await.is_applied());
    assert_eq!(applied_department(&fetcher).as_deref(), Some("All"));
}

#[tokio::test]
async fn slots_are_independent() {
    let fetcher = ReportFetcher::new(ScriptedSource::with_delays(&[80, 0]));
    let date = NaiveDate::from_ymd_opt(2025, 3, 7).expect("valid date");

    let (reports, summary, attendance) = tokio::join!(
        fetcher.fetch_reports(department("Engineering")),
        fetcher.fetch_quick_summary(date),
        fetcher.fetch_attendance(date)
    );

    assert!(reports.is_applied());
    assert!(summary.is_applied());
    assert!(attendance.is_applied());
    assert_eq!(
        fetcher.quick_summary().value().and_then(|summary| summary.date),
        Some(date)
    );
    assert_eq!(fetcher.attendance().value().map(|entries| entries.len()), Some(1));
}

#[tokio::test]
async fn failure_keeps_previous_data_and_session() {
    let context = signed_in_context();
    let fetcher = ReportFetcher::new(ScriptedSource::default()).with_context(context.clone());

    assert!(fetcher.fetch_reports(department("Engineering")).await.is_applied());

    fetcher.source().fail_next(PortalError::Api {
        status: 503,
        message: "maintenance".to_string(),
    });
    let outcome = fetcher.fetch_reports(department("Operations")).await;

    assert!(matches!(outcome, FetchOutcome::Failed(PortalError::Api { status: 503, .. })));
    assert_eq!(applied_department(&fetcher).as_deref(), Some("Engineering"));
    assert!(fetcher
        .reports()
        .error()
        .is_some_and(|err| err.contains("maintenance")));
    assert!(context.is_authenticated());
}

#[tokio::test]
async fn stale_token_signs_the_context_out() {
    let context = signed_in_context();
    let fetcher = ReportFetcher::new(ScriptedSource::default()).with_context(context.clone());

    fetcher
        .source()
        .fail_next(PortalError::Unauthorized("token expired".to_string()));
    let outcome = fetcher.fetch_reports(ReportFilter::default()).await;

    assert!(matches!(outcome, FetchOutcome::Failed(PortalError::Unauthorized(_))));
    assert!(!context.is_authenticated());
    assert!(fetcher.reports().value().is_none());
}
