use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder used for group-level fields the directory cannot resolve.
pub const NOT_AVAILABLE: &str = "N/A";

/// Filter values the portal uses to mean "no restriction".
const ALL_DEPARTMENTS: &str = "All Departments";
const ALL_TEAMS: &str = "All Teams";
const ALL_MANAGERS: &str = "All Reporting Managers";

/// One line of work inside a daily report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub details: String,
    pub status: String,
}

impl Task {
    pub fn new(details: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            details: details.into(),
            status: status.into(),
        }
    }
}

/// A submitted daily report as owned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkReport {
    #[serde(default)]
    pub id: String,
    pub employee_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_email: Option<String>,
    pub department: String,
    pub team: String,
    pub reporting_manager: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
}

impl WorkReport {
    pub fn group_key(&self) -> GroupKey<'_> {
        GroupKey {
            department: &self.department,
            team: &self.team,
            reporting_manager: &self.reporting_manager,
        }
    }
}

/// Borrowed (department, team, reporting manager) tuple. Compared by exact string equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey<'a> {
    pub department: &'a str,
    pub team: &'a str,
    pub reporting_manager: &'a str,
}

/// Ordered list of task statuses published by the backend.
///
/// The order is the display order used by every renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct StatusCatalog {
    statuses: Vec<String>,
}

impl StatusCatalog {
    pub fn standard() -> Self {
        Self::from_options(["WIP", "Completed", "Yet to Start", "Delayed"])
    }

    /// Builds a catalog keeping the first occurrence of each non-blank status.
    pub fn from_options<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut statuses: Vec<String> = Vec::new();
        for option in options {
            let status = option.into().trim().to_string();
            if !status.is_empty() && !statuses.contains(&status) {
                statuses.push(status);
            }
        }
        Self { statuses }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.statuses.iter().map(String::as_str)
    }

    pub fn contains(&self, status: &str) -> bool {
        self.statuses.iter().any(|known| known == status)
    }

    pub fn position(&self, status: &str) -> Option<usize> {
        self.statuses.iter().position(|known| known == status)
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

impl Default for StatusCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl From<Vec<String>> for StatusCatalog {
    fn from(value: Vec<String>) -> Self {
        Self::from_options(value)
    }
}

impl From<StatusCatalog> for Vec<String> {
    fn from(value: StatusCatalog) -> Self {
        value.statuses
    }
}

/// Filter selection applied to report listings and exports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_date: Option<NaiveDate>,
}

impl ReportFilter {
    /// Drops blank values and the "All ..." sentinels the portal dropdowns emit.
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>, sentinel: &str) -> Option<String> {
            value
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty() && raw != sentinel)
        }

        Self {
            department: clean(self.department, ALL_DEPARTMENTS),
            team: clean(self.team, ALL_TEAMS),
            manager: clean(self.manager, ALL_MANAGERS),
            from_date: self.from_date,
            to_date: self.to_date,
        }
    }

    pub fn matches(&self, report: &WorkReport) -> bool {
        let field_matches =
            |wanted: &Option<String>, actual: &str| wanted.as_deref().map_or(true, |w| w == actual);

        field_matches(&self.department, &report.department)
            && field_matches(&self.team, &report.team)
            && field_matches(&self.manager, &report.reporting_manager)
            && self.from_date.map_or(true, |from| report.date >= from)
            && self.to_date.map_or(true, |to| report.date <= to)
    }

    pub fn apply<'a>(&self, reports: &'a [WorkReport]) -> Vec<&'a WorkReport> {
        reports.iter().filter(|report| self.matches(report)).collect()
    }

    /// Query pairs understood by the backend's listing and export endpoints.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(department) = &self.department {
            pairs.push(("department", department.clone()));
        }
        if let Some(team) = &self.team {
            pairs.push(("team", team.clone()));
        }
        if let Some(manager) = &self.manager {
            pairs.push(("manager", manager.clone()));
        }
        if let Some(from) = self.from_date {
            pairs.push(("from_date", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.to_date {
            pairs.push(("to_date", to.format("%Y-%m-%d").to_string()));
        }
        pairs
    }

    /// Human-readable description for document headers, `None` when unfiltered.
    pub fn describe(&self) -> Option<String> {
        let mut parts = Vec::new();
        match (self.from_date, self.to_date) {
            (Some(from), Some(to)) if from == to => parts.push(format!("Date: {from}")),
            (Some(from), Some(to)) => parts.push(format!("Date range: {from} to {to}")),
            (Some(from), None) => parts.push(format!("From: {from}")),
            (None, Some(to)) => parts.push(format!("Up to: {to}")),
            (None, None) => {}
        }
        if let Some(department) = &self.department {
            parts.push(format!("Department: {department}"));
        }
        if let Some(team) = &self.team {
            parts.push(format!("Team: {team}"));
        }
        if let Some(manager) = &self.manager {
            parts.push(format!("Reporting manager: {manager}"));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" | "))
        }
    }
}

/// A resolved reviewer, or the explicit not-available marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Reviewer {
    Named(String),
    NotAvailable,
}

impl Reviewer {
    pub fn label(&self) -> &str {
        match self {
            Reviewer::Named(name) => name,
            Reviewer::NotAvailable => NOT_AVAILABLE,
        }
    }
}

impl Default for Reviewer {
    fn default() -> Self {
        Reviewer::NotAvailable
    }
}

impl From<Option<String>> for Reviewer {
    fn from(value: Option<String>) -> Self {
        match value.map(|raw| raw.trim().to_string()) {
            Some(name) if !name.is_empty() && name != NOT_AVAILABLE => Reviewer::Named(name),
            _ => Reviewer::NotAvailable,
        }
    }
}

impl From<Reviewer> for String {
    fn from(value: Reviewer) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for Reviewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Trimmed, case-insensitive identity used when matching people across records.
pub(crate) fn identity(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).expect("valid date")
    }

    fn report(department: &str, team: &str, manager: &str, day: u32) -> WorkReport {
        WorkReport {
            id: format!("r-{day}"),
            employee_name: "Asha".to_string(),
            employee_email: None,
            department: department.to_string(),
            team: team.to_string(),
            reporting_manager: manager.to_string(),
            date: date(day),
            tasks: Vec::new(),
            last_modified_by: None,
        }
    }

    #[test]
    fn catalog_drops_duplicates_and_blanks() {
        let catalog = StatusCatalog::from_options(["WIP", " ", "Completed", "WIP", "Delayed "]);
        assert_eq!(
            catalog.iter().collect::<Vec<_>>(),
            vec!["WIP", "Completed", "Delayed"]
        );
        assert_eq!(catalog.position("Delayed"), Some(2));
        assert!(!catalog.contains("Blocked"));
    }

    #[test]
    fn normalized_filter_ignores_sentinels() {
        let filter = ReportFilter {
            department: Some("All Departments".to_string()),
            team: Some("  ".to_string()),
            manager: Some("All Reporting Managers".to_string()),
            from_date: None,
            to_date: None,
        }
        .normalized();

        assert_eq!(filter, ReportFilter::default());
        assert!(filter.describe().is_none());
        assert!(filter.query_pairs().is_empty());
    }

    #[test]
    fn filter_matches_inclusive_date_range_and_fields() {
        let filter = ReportFilter {
            department: Some("Eng".to_string()),
            from_date: Some(date(2)),
            to_date: Some(date(4)),
            ..ReportFilter::default()
        };

        assert!(filter.matches(&report("Eng", "Core", "M1", 2)));
        assert!(filter.matches(&report("Eng", "Core", "M1", 4)));
        assert!(!filter.matches(&report("Eng", "Core", "M1", 5)));
        assert!(!filter.matches(&report("Ops", "Core", "M1", 3)));
        assert_eq!(
            filter.describe().as_deref(),
            Some("Date range: 2025-03-02 to 2025-03-04 | Department: Eng")
        );
    }

    #[test]
    fn reviewer_treats_blank_and_marker_as_not_available() {
        assert_eq!(Reviewer::from(None), Reviewer::NotAvailable);
        assert_eq!(Reviewer::from(Some(" ".to_string())), Reviewer::NotAvailable);
        assert_eq!(Reviewer::from(Some("N/A".to_string())), Reviewer::NotAvailable);
        assert_eq!(
            Reviewer::from(Some("Anant".to_string())).label(),
            "Anant"
        );
    }

    #[test]
    fn work_report_accepts_backend_payload_with_extra_fields() {
        let payload = r#"{
            "id": "abc",
            "employee_name": "Asha",
            "employee_email": "asha@example.com",
            "department": "Eng",
            "team": "Core",
            "reporting_manager": "M1",
            "date": "2025-03-02",
            "tasks": [{"id": "t1", "details": "Ship", "status": "WIP"}],
            "submitted_at": "2025-03-02T10:00:00+05:30"
        }"#;

        let report: WorkReport = serde_json::from_str(payload).expect("payload parses");
        assert_eq!(report.tasks, vec![Task::new("Ship", "WIP")]);
        assert_eq!(report.employee_email.as_deref(), Some("asha@example.com"));
    }
}
