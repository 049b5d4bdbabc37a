use crate::reports::directory::{DepartmentDirectory, Designation};
use crate::reports::domain::{identity, WorkReport};
use std::collections::HashSet;

/// Which reports a signed-in person may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportScope {
    /// Only reports authored with this email.
    Own(String),
    /// Reports authored by any of these emails (the manager and their hierarchy).
    Team(HashSet<String>),
    /// No restriction (directors and administrators).
    All,
}

impl ReportScope {
    /// Resolves the scope of `viewer_email` from their directory designation.
    pub fn for_viewer(viewer_email: &str, directory: &DepartmentDirectory) -> Self {
        let Some(entry) = directory.find_by_email(viewer_email) else {
            return ReportScope::Own(identity(viewer_email));
        };

        match entry.member.designation.as_ref() {
            Some(Designation::Employee) => ReportScope::Own(identity(viewer_email)),
            Some(designation) if designation.is_manager() => {
                let mut emails: HashSet<String> = directory
                    .employees_under(&entry.member.name)
                    .into_iter()
                    .filter_map(|member| member.email.as_deref().map(identity))
                    .collect();
                emails.insert(identity(viewer_email));
                ReportScope::Team(emails)
            }
            _ => ReportScope::All,
        }
    }

    /// Reports without an author email are only visible to unrestricted viewers.
    pub fn permits(&self, report: &WorkReport) -> bool {
        let author = report.employee_email.as_deref().map(identity);
        match self {
            ReportScope::All => true,
            ReportScope::Own(email) => author.as_deref() == Some(email.as_str()),
            ReportScope::Team(emails) => author.map_or(false, |author| emails.contains(&author)),
        }
    }

    pub fn visible(&self, reports: &[WorkReport]) -> Vec<WorkReport> {
        reports
            .iter()
            .filter(|report| self.permits(report))
            .cloned()
            .collect()
    }
}
