//! Reporting core: reference data, aggregation, row-span rendering and exports.

pub mod aggregate;
pub mod bundle;
pub mod directory;
pub mod domain;
pub mod drafts;
pub mod export;
pub mod render;

pub use aggregate::{
    attendance_summary, group_reports, quick_summary, user_summary, AttendanceSummaryEntry,
    GroupOrder, QuickSummary, QuickSummaryEntry, ReportGroup, ReportGrouper, ReportScope,
};
pub use bundle::{BundleError, ReportBundle};
pub use directory::{DepartmentDirectory, Designation, Member};
pub use domain::{ReportFilter, Reviewer, StatusCatalog, Task, WorkReport};
pub use drafts::{DraftError, NewWorkReport, ReportDraft, ReportEditSession, WorkReportUpdate};
pub use export::{ExportError, ExportFormat, Exporter};
pub use render::{render_groups, TabularReport};
