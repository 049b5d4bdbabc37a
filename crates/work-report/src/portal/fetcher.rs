use super::client::BackendClient;
use super::session::PortalContext;
use super::PortalError;
use crate::reports::aggregate::{
    attendance_summary, quick_summary, AttendanceSummaryEntry, QuickSummary,
};
use crate::reports::bundle::ReportBundle;
use crate::reports::directory::DepartmentDirectory;
use crate::reports::domain::{ReportFilter, StatusCatalog, WorkReport};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Where reference data and reports come from: the live backend or a local snapshot.
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn departments(&self) -> Result<DepartmentDirectory, PortalError>;

    async fn status_options(&self) -> Result<StatusCatalog, PortalError>;

    async fn reports(&self, filter: &ReportFilter) -> Result<Vec<WorkReport>, PortalError>;

    async fn quick_summary(&self, date: NaiveDate) -> Result<QuickSummary, PortalError>;

    async fn attendance(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceSummaryEntry>, PortalError>;
}

#[async_trait]
impl ReportSource for BackendClient {
    async fn departments(&self) -> Result<DepartmentDirectory, PortalError> {
        BackendClient::departments(self).await
    }

    async fn status_options(&self) -> Result<StatusCatalog, PortalError> {
        BackendClient::status_options(self).await
    }

    async fn reports(&self, filter: &ReportFilter) -> Result<Vec<WorkReport>, PortalError> {
        self.work_reports(filter).await
    }

    async fn quick_summary(&self, date: NaiveDate) -> Result<QuickSummary, PortalError> {
        BackendClient::quick_summary(self, date).await
    }

    async fn attendance(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceSummaryEntry>, PortalError> {
        self.attendance_summary(date).await
    }
}

#[async_trait]
impl ReportSource for ReportBundle {
    async fn departments(&self) -> Result<DepartmentDirectory, PortalError> {
        Ok(self.departments.clone())
    }

    async fn status_options(&self) -> Result<StatusCatalog, PortalError> {
        Ok(self.catalog())
    }

    async fn reports(&self, filter: &ReportFilter) -> Result<Vec<WorkReport>, PortalError> {
        Ok(self.filtered(filter))
    }

    async fn quick_summary(&self, date: NaiveDate) -> Result<QuickSummary, PortalError> {
        Ok(quick_summary(date, &self.reports, &self.departments))
    }

    async fn attendance(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceSummaryEntry>, PortalError> {
        Ok(attendance_summary(date, &self.reports, &self.departments))
    }
}

#[async_trait]
impl<S: ReportSource + ?Sized> ReportSource for Arc<S> {
    async fn departments(&self) -> Result<DepartmentDirectory, PortalError> {
        (**self).departments().await
    }

    async fn status_options(&self) -> Result<StatusCatalog, PortalError> {
        (**self).status_options().await
    }

    async fn reports(&self, filter: &ReportFilter) -> Result<Vec<WorkReport>, PortalError> {
        (**self).reports(filter).await
    }

    async fn quick_summary(&self, date: NaiveDate) -> Result<QuickSummary, PortalError> {
        (**self).quick_summary(date).await
    }

    async fn attendance(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceSummaryEntry>, PortalError> {
        (**self).attendance(date).await
    }
}

/// Result of settling one fetch against its slot.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The response was the latest issued and replaced the slot's value.
    Applied,
    /// A newer fetch was issued meanwhile; the response was dropped.
    Superseded,
    /// The latest fetch failed; the previous value stays and the error is recorded.
    Failed(PortalError),
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied)
    }
}

/// Sequence number handed out when a fetch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug)]
struct SlotState<T> {
    value: Option<T>,
    applied: u64,
    error: Option<String>,
}

/// Independent state slot for one kind of fetch. The last issued request wins.
#[derive(Debug)]
pub struct FetchSlot<T> {
    name: &'static str,
    issued: AtomicU64,
    state: Mutex<SlotState<T>>,
}

impl<T> FetchSlot<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            issued: AtomicU64::new(0),
            state: Mutex::new(SlotState {
                value: None,
                applied: 0,
                error: None,
            }),
        }
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn complete(&self, ticket: Ticket, result: Result<T, PortalError>) -> FetchOutcome {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let latest = self.issued.load(Ordering::SeqCst);
        if ticket.0 != latest {
            debug!(slot = self.name, ticket = ticket.0, latest, "discarding superseded response");
            return FetchOutcome::Superseded;
        }

        match result {
            Ok(value) => {
                state.value = Some(value);
                state.applied = ticket.0;
                state.error = None;
                FetchOutcome::Applied
            }
            Err(err) => {
                warn!(slot = self.name, error = %err, "fetch failed, keeping previous data");
                state.error = Some(err.to_string());
                FetchOutcome::Failed(err)
            }
        }
    }

    /// Issues a ticket, awaits `fetch` and settles it.
    pub async fn run<F>(&self, fetch: F) -> FetchOutcome
    where
        F: Future<Output = Result<T, PortalError>>,
    {
        let ticket = self.issue();
        let result = fetch.await;
        self.complete(ticket, result)
    }

    pub fn error(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .error
            .clone()
    }

    /// Ticket of the response currently held, if any.
    pub fn applied(&self) -> Option<Ticket> {
        let applied = self.state.lock().unwrap_or_else(PoisonError::into_inner).applied;
        (applied > 0).then_some(Ticket(applied))
    }
}

impl<T: Clone> FetchSlot<T> {
    pub fn value(&self) -> Option<T> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .value
            .clone()
    }
}

/// Report, quick-summary and attendance fetches over one source, each in its own slot.
pub struct ReportFetcher<S> {
    source: S,
    context: Option<Arc<PortalContext>>,
    reports: FetchSlot<Vec<WorkReport>>,
    quick_summary: FetchSlot<QuickSummary>,
    attendance: FetchSlot<Vec<AttendanceSummaryEntry>>,
}

impl<S: ReportSource> ReportFetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            context: None,
            reports: FetchSlot::new("reports"),
            quick_summary: FetchSlot::new("quick_summary"),
            attendance: FetchSlot::new("attendance"),
        }
    }

    /// Signs the context out whenever a fetch fails with a stale session.
    pub fn with_context(mut self, context: Arc<PortalContext>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn settle(&self, outcome: FetchOutcome) -> FetchOutcome {
        if let (FetchOutcome::Failed(err), Some(context)) = (&outcome, &self.context) {
            if err.requires_logout() {
                context.logout();
            }
        }
        outcome
    }

    pub async fn fetch_reports(&self, filter: ReportFilter) -> FetchOutcome {
        let filter = filter.normalized();
        let outcome = self.reports.run(self.source.reports(&filter)).await;
        self.settle(outcome)
    }

    pub async fn fetch_quick_summary(&self, date: NaiveDate) -> FetchOutcome {
        let outcome = self.quick_summary.run(self.source.quick_summary(date)).await;
        self.settle(outcome)
    }

    pub async fn fetch_attendance(&self, date: NaiveDate) -> FetchOutcome {
        let outcome = self.attendance.run(self.source.attendance(date)).await;
        self.settle(outcome)
    }

    pub fn reports(&self) -> &FetchSlot<Vec<WorkReport>> {
        &self.reports
    }

    pub fn quick_summary(&self) -> &FetchSlot<QuickSummary> {
        &self.quick_summary
    }

    pub fn attendance(&self) -> &FetchSlot<Vec<AttendanceSummaryEntry>> {
        &self.attendance
    }
}
