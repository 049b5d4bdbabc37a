use super::directory::DepartmentDirectory;
use super::domain::{ReportFilter, StatusCatalog, WorkReport};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Everything the aggregators need, in one serializable snapshot.
///
/// Used for offline CLI runs and as the body of the report endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportBundle {
    #[serde(default)]
    pub departments: DepartmentDirectory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_options: Option<StatusCatalog>,
    #[serde(default)]
    pub reports: Vec<WorkReport>,
}

impl ReportBundle {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BundleError> {
        let file = std::fs::File::open(path.as_ref())?;
        Ok(Self::from_reader(std::io::BufReader::new(file))?)
    }

    pub fn catalog(&self) -> StatusCatalog {
        self.status_options.clone().unwrap_or_default()
    }

    /// Reports matching `filter`, cloned so callers can hand them to aggregators.
    pub fn filtered(&self, filter: &ReportFilter) -> Vec<WorkReport> {
        filter.apply(&self.reports).into_iter().cloned().collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("unable to read report snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("report snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_status_options_fall_back_to_standard_catalog() {
        let bundle = ReportBundle::from_reader(r#"{"departments": {}, "reports": []}"#.as_bytes())
            .expect("bundle parses");
        assert_eq!(bundle.catalog(), StatusCatalog::standard());
    }

    #[test]
    fn filtered_applies_normalized_filter() {
        let bundle = ReportBundle::from_reader(
            r#"{
                "status_options": ["WIP", "Completed"],
                "reports": [
                    {"employee_name": "A", "department": "Eng", "team": "Core", "reporting_manager": "M1", "date": "2025-03-01", "tasks": []},
                    {"employee_name": "B", "department": "Ops", "team": "Field", "reporting_manager": "M2", "date": "2025-03-01", "tasks": []}
                ]
            }"#
            .as_bytes(),
        )
        .expect("bundle parses");

        let filter = ReportFilter {
            department: Some("Ops".to_string()),
            ..ReportFilter::default()
        };
        let reports = bundle.filtered(&filter);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].employee_name, "B");
        assert_eq!(bundle.catalog().len(), 2);
    }
}
