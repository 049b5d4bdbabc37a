use crate::reports::directory::DepartmentDirectory;
use crate::reports::domain::{GroupKey, Reviewer, StatusCatalog, Task, WorkReport};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Tasks of one status inside a group, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBucket {
    pub status: String,
    pub tasks: Vec<Task>,
}

/// Ordered status → tasks mapping.
///
/// On the wire this is a JSON object whose values are `[{"details": ...}]`; key order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TasksByStatus {
    buckets: Vec<StatusBucket>,
}

impl TasksByStatus {
    /// One empty bucket per catalog status, in catalog order.
    pub fn for_catalog(catalog: &StatusCatalog) -> Self {
        Self {
            buckets: catalog
                .iter()
                .map(|status| StatusBucket {
                    status: status.to_string(),
                    tasks: Vec::new(),
                })
                .collect(),
        }
    }

    /// Appends a task to its status bucket, opening a trailing bucket for unknown statuses.
    pub fn push(&mut self, task: Task) {
        match self
            .buckets
            .iter_mut()
            .find(|bucket| bucket.status == task.status)
        {
            Some(bucket) => bucket.tasks.push(task),
            None => self.buckets.push(StatusBucket {
                status: task.status.clone(),
                tasks: vec![task],
            }),
        }
    }

    pub fn get(&self, status: &str) -> Option<&[Task]> {
        self.buckets
            .iter()
            .find(|bucket| bucket.status == status)
            .map(|bucket| bucket.tasks.as_slice())
    }

    pub fn buckets(&self) -> &[StatusBucket] {
        &self.buckets
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.tasks.len()).sum()
    }

    /// Buckets in catalog order, followed by any statuses the catalog does not know.
    pub fn in_catalog_order<'a>(&'a self, catalog: &'a StatusCatalog) -> Vec<&'a StatusBucket> {
        let known = catalog.iter().filter_map(|status| {
            self.buckets.iter().find(|bucket| bucket.status == status)
        });
        let unknown = self
            .buckets
            .iter()
            .filter(|bucket| !catalog.contains(&bucket.status));
        known.chain(unknown).collect()
    }

    /// Guarantees every catalog status is present and reorders buckets to catalog order.
    pub fn normalize(&mut self, catalog: &StatusCatalog) {
        let mut normalized = Self::for_catalog(catalog);
        for bucket in self.buckets.drain(..) {
            if bucket.tasks.is_empty() && !catalog.contains(&bucket.status) {
                normalized.buckets.push(bucket);
                continue;
            }
            for task in bucket.tasks {
                normalized.push(task);
            }
        }
        *self = normalized;
    }
}

#[derive(Serialize, Deserialize)]
struct TaskDetail {
    details: String,
}

impl Serialize for TasksByStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for bucket in &self.buckets {
            let details: Vec<TaskDetail> = bucket
                .tasks
                .iter()
                .map(|task| TaskDetail {
                    details: task.details.clone(),
                })
                .collect();
            map.serialize_entry(&bucket.status, &details)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TasksByStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BucketVisitor;

        impl<'de> Visitor<'de> for BucketVisitor {
            type Value = TasksByStatus;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map from status to task details")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut buckets = Vec::new();
                while let Some((status, details)) =
                    access.next_entry::<String, Vec<TaskDetail>>()?
                {
                    let tasks = details
                        .into_iter()
                        .map(|detail| Task::new(detail.details, status.clone()))
                        .collect();
                    buckets.push(StatusBucket { status, tasks });
                }
                Ok(TasksByStatus { buckets })
            }
        }

        deserializer.deserialize_map(BucketVisitor)
    }
}

/// Tasks of one (department, team, reporting manager) bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportGroup {
    pub department: String,
    pub team: String,
    pub reporting_manager: String,
    pub no_of_resource: usize,
    #[serde(default)]
    pub reviewer: Reviewer,
    pub tasks_by_status: TasksByStatus,
}

impl ReportGroup {
    pub fn total_tasks(&self) -> usize {
        self.tasks_by_status.total()
    }

    pub fn has_tasks(&self) -> bool {
        self.total_tasks() > 0
    }

    pub fn key(&self) -> GroupKey<'_> {
        GroupKey {
            department: &self.department,
            team: &self.team,
            reporting_manager: &self.reporting_manager,
        }
    }
}

/// How groups are ordered in the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOrder {
    /// First-encounter order of the input reports.
    #[default]
    Encounter,
    /// Department, then team, then reporting manager.
    Sorted,
}

/// Reduces flat reports into [`ReportGroup`]s against a reference directory.
pub struct ReportGrouper<'a> {
    directory: &'a DepartmentDirectory,
    catalog: &'a StatusCatalog,
    order: GroupOrder,
}

impl<'a> ReportGrouper<'a> {
    pub fn new(directory: &'a DepartmentDirectory, catalog: &'a StatusCatalog) -> Self {
        Self {
            directory,
            catalog,
            order: GroupOrder::Encounter,
        }
    }

    pub fn order(mut self, order: GroupOrder) -> Self {
        self.order = order;
        self
    }

    pub fn group<'r, I>(&self, reports: I) -> Vec<ReportGroup>
    where
        I: IntoIterator<Item = &'r WorkReport>,
    {
        let mut groups: Vec<ReportGroup> = Vec::new();
        let mut index: HashMap<(String, String, String), usize> = HashMap::new();

        for report in reports {
            let key = (
                report.department.clone(),
                report.team.clone(),
                report.reporting_manager.clone(),
            );
            let position = *index.entry(key).or_insert_with(|| {
                groups.push(self.open_group(report));
                groups.len() - 1
            });

            let group = &mut groups[position];
            for task in &report.tasks {
                group.tasks_by_status.push(task.clone());
            }
        }

        if self.order == GroupOrder::Sorted {
            groups.sort_by(|left, right| left.key().cmp(&right.key()));
        }

        groups
    }

    fn open_group(&self, report: &WorkReport) -> ReportGroup {
        ReportGroup {
            department: report.department.clone(),
            team: report.team.clone(),
            reporting_manager: report.reporting_manager.clone(),
            no_of_resource: self
                .directory
                .resource_count(&report.department, &report.team),
            reviewer: self.directory.reviewer_of(
                &report.department,
                &report.team,
                &report.reporting_manager,
            ),
            tasks_by_status: TasksByStatus::for_catalog(self.catalog),
        }
    }
}

/// Convenience wrapper using encounter order.
pub fn group_reports(
    reports: &[WorkReport],
    directory: &DepartmentDirectory,
    catalog: &StatusCatalog,
) -> Vec<ReportGroup> {
    ReportGrouper::new(directory, catalog).group(reports)
}

/// Single-employee summary: always one group, even with no reports.
///
/// The reporting manager is the employee's own reviewer and the group reviewer is
/// that manager's reviewer.
pub fn user_summary(
    employee_email: &str,
    reports: &[WorkReport],
    directory: &DepartmentDirectory,
    catalog: &StatusCatalog,
) -> Option<ReportGroup> {
    let entry = directory.find_by_email(employee_email)?;
    let manager = Reviewer::from(entry.member.reviewer.clone());
    let reviewer = match &manager {
        Reviewer::Named(name) => directory
            .find_by_name(name)
            .map(|manager_entry| Reviewer::from(manager_entry.member.reviewer.clone()))
            .unwrap_or(Reviewer::NotAvailable),
        Reviewer::NotAvailable => Reviewer::NotAvailable,
    };

    let mut tasks_by_status = TasksByStatus::for_catalog(catalog);
    for report in reports.iter().filter(|report| {
        entry
            .member
            .is_author(&report.employee_name, report.employee_email.as_deref())
    }) {
        for task in &report.tasks {
            tasks_by_status.push(task.clone());
        }
    }

    Some(ReportGroup {
        department: entry.department.to_string(),
        team: entry.team.to_string(),
        reporting_manager: manager.label().to_string(),
        no_of_resource: 1,
        reviewer,
        tasks_by_status,
    })
}
