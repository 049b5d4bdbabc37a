use crate::reports::aggregate::{ReportGroup, TasksByStatus};
use crate::reports::domain::{Reviewer, StatusCatalog, Task};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text of the single row emitted for a group without tasks.
pub const NO_TASKS_SENTINEL: &str = "No tasks reported for this group.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Department,
    Team,
    ReportingManager,
    NoOfResource,
    Reviewer,
    Tasks,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Department,
        Column::Team,
        Column::ReportingManager,
        Column::NoOfResource,
        Column::Reviewer,
        Column::Tasks,
    ];

    /// Columns emitted once per group and merged across its rows.
    pub const GROUP: [Column; 5] = [
        Column::Department,
        Column::Team,
        Column::ReportingManager,
        Column::NoOfResource,
        Column::Reviewer,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Column::Department => "Department",
            Column::Team => "Team",
            Column::ReportingManager => "Reporting Manager",
            Column::NoOfResource => "No. of Resource",
            Column::Reviewer => "Reviewer",
            Column::Tasks => "Tasks",
        }
    }
}

/// A group-level cell covering `row_span` consecutive rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub column: Column,
    pub text: String,
    pub row_span: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskCell {
    Task { status: String, details: String },
    NoTasks,
}

impl fmt::Display for TaskCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskCell::Task { status, details } => write!(f, "{status}: {details}"),
            TaskCell::NoTasks => f.write_str(NO_TASKS_SENTINEL),
        }
    }
}

/// One table row. `group_cells` is only populated on the first row of a group;
/// continuation rows are covered by the span of those cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub group_index: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_cells: Vec<Cell>,
    pub task: TaskCell,
}

impl TableRow {
    pub fn starts_group(&self) -> bool {
        !self.group_cells.is_empty()
    }

    pub fn cell(&self, column: Column) -> Option<&Cell> {
        self.group_cells.iter().find(|cell| cell.column == column)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularReport {
    pub rows: Vec<TableRow>,
}

impl TabularReport {
    pub fn header() -> [&'static str; 6] {
        Column::ALL.map(Column::label)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows belonging to each group, as consecutive slices.
    pub fn group_slices(&self) -> Vec<&[TableRow]> {
        let mut slices = Vec::new();
        let mut start = 0;
        for (index, row) in self.rows.iter().enumerate() {
            if index > start && row.starts_group() {
                slices.push(&self.rows[start..index]);
                start = index;
            }
        }
        if start < self.rows.len() {
            slices.push(&self.rows[start..]);
        }
        slices
    }

    /// Rebuilds the groups this table was rendered from.
    ///
    /// Resource counts that do not parse as integers come back as zero.
    pub fn regroup(&self, catalog: &StatusCatalog) -> Vec<ReportGroup> {
        self.group_slices()
            .into_iter()
            .filter_map(|rows| {
                let first = rows.first()?;
                let text = |column| {
                    first
                        .cell(column)
                        .map(|cell| cell.text.clone())
                        .unwrap_or_default()
                };

                let mut tasks_by_status = TasksByStatus::for_catalog(catalog);
                for row in rows {
                    if let TaskCell::Task { status, details } = &row.task {
                        tasks_by_status.push(Task::new(details.clone(), status.clone()));
                    }
                }

                Some(ReportGroup {
                    department: text(Column::Department),
                    team: text(Column::Team),
                    reporting_manager: text(Column::ReportingManager),
                    no_of_resource: text(Column::NoOfResource).parse().unwrap_or(0),
                    reviewer: Reviewer::from(Some(text(Column::Reviewer))),
                    tasks_by_status,
                })
            })
            .collect()
    }
}

/// Projects groups into row-span rows.
///
/// Tasks follow catalog status order, then bucket order; statuses the catalog
/// does not list come last.
pub fn render_groups(groups: &[ReportGroup], catalog: &StatusCatalog) -> TabularReport {
    let mut rows = Vec::new();

    for (group_index, group) in groups.iter().enumerate() {
        let tasks: Vec<TaskCell> = group
            .tasks_by_status
            .in_catalog_order(catalog)
            .into_iter()
            .flat_map(|bucket| {
                bucket.tasks.iter().map(|task| TaskCell::Task {
                    status: bucket.status.clone(),
                    details: task.details.clone(),
                })
            })
            .collect();

        let (row_span, tasks) = if tasks.is_empty() {
            (1, vec![TaskCell::NoTasks])
        } else {
            (tasks.len(), tasks)
        };

        let group_cells = group_cells(group, row_span);
        for (offset, task) in tasks.into_iter().enumerate() {
            rows.push(TableRow {
                group_index,
                group_cells: if offset == 0 {
                    group_cells.clone()
                } else {
                    Vec::new()
                },
                task,
            });
        }
    }

    TabularReport { rows }
}

fn group_cells(group: &ReportGroup, row_span: usize) -> Vec<Cell> {
    Column::GROUP
        .iter()
        .map(|&column| {
            let text = match column {
                Column::Department => group.department.clone(),
                Column::Team => group.team.clone(),
                Column::ReportingManager => group.reporting_manager.clone(),
                Column::NoOfResource => group.no_of_resource.to_string(),
                Column::Reviewer => group.reviewer.label().to_string(),
                Column::Tasks => String::new(),
            };
            Cell {
                column,
                text,
                row_span,
            }
        })
        .collect()
}
