//! Pure reductions from flat report records to derived summaries.

pub mod attendance;
pub mod grouping;
pub mod quick_summary;
pub mod visibility;

pub use attendance::{attendance_summary, AttendanceCounts, AttendanceSummaryEntry};
pub use grouping::{
    group_reports, user_summary, GroupOrder, ReportGroup, ReportGrouper, StatusBucket,
    TasksByStatus,
};
pub use quick_summary::{quick_summary, QuickSummary, QuickSummaryEntry};
pub use visibility::ReportScope;
