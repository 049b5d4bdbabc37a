use super::ExportError;
use crate::reports::domain::{Task, WorkReport};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::io::Read;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Employee Name")]
    employee_name: &'a str,
    #[serde(rename = "Department")]
    department: &'a str,
    #[serde(rename = "Team")]
    team: &'a str,
    #[serde(rename = "Reporting Manager")]
    reporting_manager: &'a str,
    #[serde(rename = "Task Details")]
    task_details: &'a str,
    #[serde(rename = "Status")]
    status: &'a str,
}

/// Flat export: one line per report-task pair. Reports without tasks produce no lines.
pub fn write_reports_csv(reports: &[WorkReport]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if reports.iter().all(|report| report.tasks.is_empty()) {
        writer.write_record([
            "Date",
            "Employee Name",
            "Department",
            "Team",
            "Reporting Manager",
            "Task Details",
            "Status",
        ])?;
    }

    for report in reports {
        for task in &report.tasks {
            writer.serialize(ExportRow {
                date: report.date,
                employee_name: &report.employee_name,
                department: &report.department,
                team: &report.team,
                reporting_manager: &report.reporting_manager,
                task_details: &task.details,
                status: &task.status,
            })?;
        }
    }

    writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))
}

#[derive(Debug, Deserialize)]
struct ImportRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Employee Name")]
    employee_name: String,
    #[serde(
        rename = "Employee Email",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    employee_email: Option<String>,
    #[serde(rename = "Department")]
    department: String,
    #[serde(rename = "Team")]
    team: String,
    #[serde(rename = "Reporting Manager")]
    reporting_manager: String,
    #[serde(rename = "Task Details")]
    task_details: String,
    #[serde(rename = "Status")]
    status: String,
    #[serde(
        rename = "Last Modified By",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    last_modified_by: Option<String>,
}

impl ImportRow {
    fn continues(&self, report: &WorkReport) -> bool {
        report.date == self.date
            && report.employee_name == self.employee_name
            && report.employee_email == self.employee_email
            && report.department == self.department
            && report.team == self.team
            && report.reporting_manager == self.reporting_manager
    }
}

/// Reads a task-per-line export back into reports.
///
/// Accepts this crate's seven-column export as well as the backend's wider one; unknown
/// columns are ignored. Consecutive lines from the same author, date and group form one report.
pub fn parse_export<R: Read>(reader: R) -> Result<Vec<WorkReport>, ExportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut reports: Vec<WorkReport> = Vec::new();

    for record in csv_reader.deserialize::<ImportRow>() {
        let row = record?;
        let task = Task::new(row.task_details.clone(), row.status.clone());

        match reports.last_mut() {
            Some(report) if row.continues(report) => report.tasks.push(task),
            _ => reports.push(WorkReport {
                id: String::new(),
                employee_name: row.employee_name,
                employee_email: row.employee_email,
                department: row.department,
                team: row.team,
                reporting_manager: row.reporting_manager,
                date: row.date,
                tasks: vec![task],
                last_modified_by: row.last_modified_by,
            }),
        }
    }

    Ok(reports)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str, tasks: Vec<Task>) -> WorkReport {
        WorkReport {
            id: "r1".to_string(),
            employee_name: name.to_string(),
            employee_email: None,
            department: "Eng".to_string(),
            team: "Core".to_string(),
            reporting_manager: "M1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 3).expect("valid date"),
            tasks,
            last_modified_by: None,
        }
    }

    #[test]
    fn writes_one_line_per_task_with_quoting() {
        let reports = vec![
            report(
                "E1",
                vec![Task::new("Fix \"login\", retry", "WIP"), Task::new("Docs", "Completed")],
            ),
            report("E2", Vec::new()),
        ];
        let bytes = write_reports_csv(&reports).expect("csv written");
        let text = String::from_utf8(bytes).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Date,Employee Name,Department,Team,Reporting Manager,Task Details,Status"
        );
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "2025-03-03,E1,Eng,Core,M1,\"Fix \"\"login\"\", retry\",WIP"
        );
    }

    #[test]
    fn header_is_written_for_empty_exports() {
        let bytes = write_reports_csv(&[]).expect("csv written");
        let text = String::from_utf8(bytes).expect("utf8");
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn reads_back_own_export() {
        let reports = vec![report(
            "E1",
            vec![Task::new("A", "WIP"), Task::new("B", "Delayed")],
        )];
        let bytes = write_reports_csv(&reports).expect("csv written");
        let parsed = parse_export(bytes.as_slice()).expect("parses");

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].tasks, reports[0].tasks);
        assert_eq!(parsed[0].employee_name, "E1");
    }

    #[test]
    fn reads_backend_export_ignoring_extra_columns() {
        let csv = "\
Date,Employee Name,Employee Email,Department,Team,Reporting Manager,Task Details,Status,Submitted At (IST),Last Modified At (IST),Last Modified By
2025-03-03,E1,e1@example.com,Eng,Core,M1,\"Ship, then test\",WIP,2025-03-03 10:00:00,,
2025-03-03,E1,e1@example.com,Eng,Core,M1,Review,Completed,2025-03-03 10:00:00,,M1
2025-03-03,E2,,Eng,Core,M1,Plan,Yet to Start,2025-03-03 11:00:00,,
";
        let parsed = parse_export(csv.as_bytes()).expect("parses");

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].tasks.len(), 2);
        assert_eq!(parsed[0].tasks[0].details, "Ship, then test");
        assert_eq!(parsed[0].employee_email.as_deref(), Some("e1@example.com"));
        assert_eq!(parsed[1].employee_email, None);
        assert_eq!(parsed[1].tasks[0].status, "Yet to Start");
    }
}
