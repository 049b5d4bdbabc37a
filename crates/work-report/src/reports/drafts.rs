use crate::portal::session::Role;
use crate::reports::domain::{StatusCatalog, Task, WorkReport};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("a report needs at least one task")]
    NoTasks,
    #[error("task {index} has no details")]
    EmptyDetails { index: usize },
    #[error("task {index} has unknown status `{status}`")]
    UnknownStatus { index: usize, status: String },
    #[error("task {index} does not exist")]
    NoSuchTask { index: usize },
    #[error("only managers can edit submitted reports")]
    Forbidden,
}

/// Form state of a new daily report before submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDraft {
    pub employee_name: String,
    pub department: String,
    pub team: String,
    pub reporting_manager: String,
    pub date: Option<NaiveDate>,
    pub tasks: Vec<Task>,
}

/// Body of `POST /work-reports`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWorkReport {
    pub employee_name: String,
    pub department: String,
    pub team: String,
    pub reporting_manager: String,
    pub date: NaiveDate,
    pub tasks: Vec<Task>,
}

/// Body of `PUT /work-reports/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkReportUpdate {
    pub tasks: Vec<Task>,
}

fn required(value: &str, field: &'static str) -> Result<String, DraftError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(DraftError::MissingField { field })
    } else {
        Ok(trimmed.to_string())
    }
}

fn validate_tasks(tasks: &[Task], catalog: &StatusCatalog) -> Result<Vec<Task>, DraftError> {
    if tasks.is_empty() {
        return Err(DraftError::NoTasks);
    }
    tasks
        .iter()
        .enumerate()
        .map(|(index, task)| validate_task(index, task, catalog))
        .collect()
}

fn validate_task(index: usize, task: &Task, catalog: &StatusCatalog) -> Result<Task, DraftError> {
    let details = task.details.trim();
    if details.is_empty() {
        return Err(DraftError::EmptyDetails { index });
    }
    if !catalog.contains(&task.status) {
        return Err(DraftError::UnknownStatus {
            index,
            status: task.status.clone(),
        });
    }
    Ok(Task::new(details, task.status.clone()))
}

impl ReportDraft {
    pub fn add_task(&mut self, details: impl Into<String>, status: impl Into<String>) {
        self.tasks.push(Task::new(details, status));
    }

    /// Checks the draft the way the submission form does and produces the request body.
    pub fn validate(&self, catalog: &StatusCatalog) -> Result<NewWorkReport, DraftError> {
        Ok(NewWorkReport {
            employee_name: required(&self.employee_name, "employee name")?,
            department: required(&self.department, "department")?,
            team: required(&self.team, "team")?,
            reporting_manager: required(&self.reporting_manager, "reporting manager")?,
            date: self.date.ok_or(DraftError::MissingField { field: "date" })?,
            tasks: validate_tasks(&self.tasks, catalog)?,
        })
    }
}

/// A manager's local edit of a submitted report's task list.
#[derive(Debug, Clone)]
pub struct ReportEditSession {
    report: WorkReport,
    tasks: Vec<Task>,
}

impl ReportEditSession {
    pub fn begin(report: WorkReport, role: Role) -> Result<Self, DraftError> {
        if !role.is_manager() {
            return Err(DraftError::Forbidden);
        }
        let tasks = report.tasks.clone();
        Ok(Self { report, tasks })
    }

    pub fn report_id(&self) -> &str {
        &self.report.id
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn add_task(&mut self, details: impl Into<String>, status: impl Into<String>) {
        self.tasks.push(Task::new(details, status));
    }

    pub fn update_task(&mut self, index: usize, task: Task) -> Result<(), DraftError> {
        let slot = self
            .tasks
            .get_mut(index)
            .ok_or(DraftError::NoSuchTask { index })?;
        *slot = task;
        Ok(())
    }

    pub fn remove_task(&mut self, index: usize) -> Result<Task, DraftError> {
        if index >= self.tasks.len() {
            return Err(DraftError::NoSuchTask { index });
        }
        Ok(self.tasks.remove(index))
    }

    pub fn is_dirty(&self) -> bool {
        self.tasks != self.report.tasks
    }

    /// Discards local changes.
    pub fn reset(&mut self) {
        self.tasks = self.report.tasks.clone();
    }

    pub fn into_update(self, catalog: &StatusCatalog) -> Result<WorkReportUpdate, DraftError> {
        Ok(WorkReportUpdate {
            tasks: validate_tasks(&self.tasks, catalog)?,
        })
    }
}
