use super::quick_summary::{percentage, percentage_label};
use crate::reports::directory::DepartmentDirectory;
use crate::reports::domain::WorkReport;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Present/absent split of one manager's resources on a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummaryEntry {
    pub manager: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_email: Option<String>,
    pub total_resources: usize,
    pub present: usize,
    pub absent: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub present_employees: Vec<String>,
}

impl AttendanceSummaryEntry {
    /// Builds an entry from raw counts; `present` is capped at `total` so the split always adds up.
    pub fn from_counts(manager: impl Into<String>, total_resources: usize, present: usize) -> Self {
        let present = present.min(total_resources);
        Self {
            manager: manager.into(),
            manager_email: None,
            total_resources,
            present,
            absent: total_resources - present,
            present_employees: Vec::new(),
        }
    }

    pub fn attendance_pct(&self) -> Option<f64> {
        percentage(self.present, self.total_resources)
    }

    pub fn attendance_pct_label(&self) -> String {
        percentage_label(self.attendance_pct())
    }
}

/// Per-manager payload of `GET /attendance-summary`.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceCounts {
    pub total_resources: usize,
    pub present: usize,
    #[serde(default)]
    pub present_employees: Vec<String>,
    #[serde(default)]
    pub manager_email: Option<String>,
}

/// Normalizes the backend's manager-keyed attendance map into entries.
pub fn from_backend(summary: BTreeMap<String, AttendanceCounts>) -> Vec<AttendanceSummaryEntry> {
    summary
        .into_iter()
        .map(|(manager, counts)| {
            let mut entry = AttendanceSummaryEntry::from_counts(
                manager,
                counts.total_resources,
                counts.present,
            );
            entry.manager_email = counts.manager_email;
            entry.present_employees = counts.present_employees;
            entry
        })
        .collect()
}

/// Attendance for every manager with at least one employee in their hierarchy.
///
/// Present means an employee of the hierarchy submitted a report for `date`.
pub fn attendance_summary(
    date: NaiveDate,
    reports: &[WorkReport],
    directory: &DepartmentDirectory,
) -> Vec<AttendanceSummaryEntry> {
    let on_date: Vec<&WorkReport> = reports.iter().filter(|report| report.date == date).collect();

    directory
        .managers()
        .into_iter()
        .filter_map(|entry| {
            let employees = directory.employees_under(&entry.member.name);
            if employees.is_empty() {
                return None;
            }

            let present_employees: Vec<String> = employees
                .iter()
                .filter(|employee| {
                    on_date.iter().any(|report| {
                        employee.is_author(&report.employee_name, report.employee_email.as_deref())
                    })
                })
                .map(|employee| employee.name.clone())
                .collect();

            let mut summary = AttendanceSummaryEntry::from_counts(
                entry.member.name.clone(),
                employees.len(),
                present_employees.len(),
            );
            summary.manager_email = entry.member.email.clone();
            summary.present_employees = present_employees;
            Some(summary)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::directory::fixtures::directory;
    use crate::reports::domain::Task;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).expect("valid date")
    }

    fn report(name: &str) -> WorkReport {
        WorkReport {
            id: String::new(),
            employee_name: name.to_string(),
            employee_email: None,
            department: "Eng".to_string(),
            team: "Core".to_string(),
            reporting_manager: "M1".to_string(),
            date: day(),
            tasks: vec![Task::new("x", "WIP")],
            last_modified_by: None,
        }
    }

    #[test]
    fn counts_hierarchy_members_who_reported() {
        let reports = vec![report("E1"), report("E3"), report("Outsider")];
        let summary = attendance_summary(day(), &reports, &directory());

        let managers: Vec<&str> = summary.iter().map(|entry| entry.manager.as_str()).collect();
        assert_eq!(managers, vec!["M1", "Z1", "M2"]);

        let m1 = &summary[0];
        assert_eq!((m1.total_resources, m1.present, m1.absent), (3, 2, 1));
        assert_eq!(m1.present_employees, vec!["E1", "E3"]);
        assert_eq!(m1.manager_email.as_deref(), Some("m1@example.com"));

        for entry in &summary {
            assert_eq!(entry.present + entry.absent, entry.total_resources);
        }
    }

    #[test]
    fn backend_overcount_is_capped() {
        let mut raw = BTreeMap::new();
        raw.insert(
            "M1".to_string(),
            AttendanceCounts {
                total_resources: 2,
                present: 3,
                present_employees: vec![],
                manager_email: None,
            },
        );
        let entries = from_backend(raw);
        assert_eq!((entries[0].present, entries[0].absent), (2, 0));
        assert_eq!(entries[0].attendance_pct_label(), "100.0%");
    }

    #[test]
    fn zero_resources_has_no_percentage() {
        let entry = AttendanceSummaryEntry::from_counts("M9", 0, 0);
        assert_eq!(entry.attendance_pct(), None);
        assert_eq!(entry.attendance_pct_label(), "N/A");
    }
}
