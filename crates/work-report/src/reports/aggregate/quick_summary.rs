use crate::reports::directory::{DepartmentDirectory, Member};
use crate::reports::domain::{identity, WorkReport};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Reported-vs-roster counts for one team on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickSummaryEntry {
    pub department: String,
    pub team: String,
    pub reported_count: usize,
    pub total_employees: usize,
}

impl QuickSummaryEntry {
    /// Share of the roster that reported, `None` for an empty roster.
    pub fn reported_pct(&self) -> Option<f64> {
        percentage(self.reported_count, self.total_employees)
    }

    pub fn reported_pct_label(&self) -> String {
        percentage_label(self.reported_pct())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub summary: Vec<QuickSummaryEntry>,
    #[serde(default)]
    pub not_reported_managers: Vec<String>,
    #[serde(default)]
    pub not_reported_employees: Vec<String>,
}

impl QuickSummary {
    /// Clamps backend-supplied counts so `reported_count <= total_employees` holds.
    pub fn clamped(mut self) -> Self {
        for entry in &mut self.summary {
            entry.reported_count = entry.reported_count.min(entry.total_employees);
        }
        self
    }

    pub fn totals(&self) -> (usize, usize) {
        self.summary.iter().fold((0, 0), |(reported, total), entry| {
            (reported + entry.reported_count, total + entry.total_employees)
        })
    }
}

/// Computes the per-team quick summary for `date`.
///
/// A roster member has reported when any report for that date names them
/// (trimmed, case-insensitive) or carries their email.
pub fn quick_summary(
    date: NaiveDate,
    reports: &[WorkReport],
    directory: &DepartmentDirectory,
) -> QuickSummary {
    let on_date: Vec<&WorkReport> = reports.iter().filter(|report| report.date == date).collect();
    let has_reported = |member: &Member| {
        on_date
            .iter()
            .any(|report| member.is_author(&report.employee_name, report.employee_email.as_deref()))
    };

    let mut summary = Vec::new();
    let mut not_reported_managers = Vec::new();
    let mut not_reported_employees = Vec::new();
    let mut listed = HashSet::new();

    for (department, team, members) in directory.teams() {
        let mut reported_count = 0;
        for member in members {
            if has_reported(member) {
                reported_count += 1;
                continue;
            }

            let person = member
                .email_identity()
                .unwrap_or_else(|| identity(&member.name));
            if !listed.insert(person) {
                continue;
            }
            if member.is_manager() {
                not_reported_managers.push(member.name.clone());
            } else {
                not_reported_employees.push(member.name.clone());
            }
        }

        summary.push(QuickSummaryEntry {
            department: department.to_string(),
            team: team.to_string(),
            reported_count,
            total_employees: members.len(),
        });
    }

    QuickSummary {
        date: Some(date),
        summary,
        not_reported_managers,
        not_reported_employees,
    }
}

pub(crate) fn percentage(part: usize, whole: usize) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(part as f64 * 100.0 / whole as f64)
    }
}

pub(crate) fn percentage_label(value: Option<f64>) -> String {
    match value {
        Some(pct) => format!("{pct:.1}%"),
        None => crate::reports::domain::NOT_AVAILABLE.to_string(),
    }
}
