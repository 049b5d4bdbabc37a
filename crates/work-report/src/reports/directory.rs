use super::domain::{identity, Reviewer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Organisational role carried by a directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Designation {
    ReportingManager,
    ZonalManager,
    Employee,
    Other(String),
}

impl Designation {
    pub fn label(&self) -> &str {
        match self {
            Self::ReportingManager => "Reporting manager",
            Self::ZonalManager => "Zonal Managers",
            Self::Employee => "Employee",
            Self::Other(label) => label,
        }
    }

    pub fn is_manager(&self) -> bool {
        matches!(self, Self::ReportingManager | Self::ZonalManager)
    }
}

impl From<String> for Designation {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "reporting manager" => Self::ReportingManager,
            "zonal managers" | "zonal manager" => Self::ZonalManager,
            "employee" => Self::Employee,
            _ => Self::Other(value.trim().to_string()),
        }
    }
}

impl From<Designation> for String {
    fn from(value: Designation) -> Self {
        value.label().to_string()
    }
}

/// One roster entry as published by `GET /departments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Designation", default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<Designation>,
    #[serde(rename = "Reviewer", default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<String>,
    #[serde(rename = "Email ID", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Member {
    pub fn is_manager(&self) -> bool {
        self.designation
            .as_ref()
            .map_or(false, Designation::is_manager)
    }

    fn has_designation(&self, wanted: &Designation) -> bool {
        self.designation.as_ref() == Some(wanted)
    }

    pub(crate) fn email_identity(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(identity)
            .filter(|email| !email.is_empty())
    }

    /// Whether a report author (name and optional email) refers to this member.
    pub fn is_author(&self, employee_name: &str, employee_email: Option<&str>) -> bool {
        if let (Some(mine), Some(theirs)) = (self.email_identity(), employee_email.map(identity)) {
            if !theirs.is_empty() && mine == theirs {
                return true;
            }
        }
        identity(&self.name) == identity(employee_name)
    }
}

/// A member together with where it sits in the directory.
#[derive(Debug, Clone, Copy)]
pub struct MemberRef<'a> {
    pub department: &'a str,
    pub team: &'a str,
    pub member: &'a Member,
}

/// Reference structure: department → team → ordered roster.
///
/// Departments and teams iterate in name order; roster order is kept as published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepartmentDirectory {
    departments: BTreeMap<String, BTreeMap<String, Vec<Member>>>,
}

impl DepartmentDirectory {
    pub fn new(departments: BTreeMap<String, BTreeMap<String, Vec<Member>>>) -> Self {
        Self { departments }
    }

    pub fn insert_member(&mut self, department: &str, team: &str, member: Member) {
        self.departments
            .entry(department.to_string())
            .or_default()
            .entry(team.to_string())
            .or_default()
            .push(member);
    }

    pub fn departments(&self) -> impl Iterator<Item = &str> {
        self.departments.keys().map(String::as_str)
    }

    pub fn teams(&self) -> impl Iterator<Item = (&str, &str, &[Member])> {
        self.departments.iter().flat_map(|(department, teams)| {
            teams
                .iter()
                .map(move |(team, members)| {
                    (department.as_str(), team.as_str(), members.as_slice())
                })
        })
    }

    pub fn team_members(&self, department: &str, team: &str) -> &[Member] {
        self.departments
            .get(department)
            .and_then(|teams| teams.get(team))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of roster entries for a department + team.
    pub fn resource_count(&self, department: &str, team: &str) -> usize {
        self.team_members(department, team).len()
    }

    pub fn members(&self) -> impl Iterator<Item = MemberRef<'_>> {
        self.teams().flat_map(|(department, team, members)| {
            members.iter().map(move |member| MemberRef {
                department,
                team,
                member,
            })
        })
    }

    pub fn find_by_name(&self, name: &str) -> Option<MemberRef<'_>> {
        self.members().find(|entry| entry.member.name == name)
    }

    pub fn find_by_email(&self, email: &str) -> Option<MemberRef<'_>> {
        let wanted = identity(email);
        if wanted.is_empty() {
            return None;
        }
        self.members()
            .find(|entry| entry.member.email_identity().as_deref() == Some(wanted.as_str()))
    }

    /// Reviewer of `manager`: their own "Reviewer" attribute, looked up in the group's
    /// team first and then anywhere in the directory.
    pub fn reviewer_of(&self, department: &str, team: &str, manager: &str) -> Reviewer {
        let in_team = self
            .team_members(department, team)
            .iter()
            .find(|member| member.name == manager);
        let member = in_team.or_else(|| self.find_by_name(manager).map(|entry| entry.member));
        Reviewer::from(member.and_then(|member| member.reviewer.clone()))
    }

    /// Distinct managers (by email, falling back to name) in directory order.
    pub fn managers(&self) -> Vec<MemberRef<'_>> {
        let mut seen = HashSet::new();
        self.members()
            .filter(|entry| entry.member.is_manager())
            .filter(|entry| {
                let key = entry
                    .member
                    .email_identity()
                    .unwrap_or_else(|| identity(&entry.member.name));
                seen.insert(key)
            })
            .collect()
    }

    /// Employees reporting to `manager_name`, directly or through zonal managers
    /// who report to them. Deduplicated by email; entries without email are skipped.
    pub fn employees_under(&self, manager_name: &str) -> Vec<&Member> {
        let mut collected = Vec::new();
        let mut seen_emails = HashSet::new();
        let mut visited_managers = HashSet::new();
        self.collect_employees(
            manager_name,
            &mut collected,
            &mut seen_emails,
            &mut visited_managers,
        );
        collected
    }

    fn collect_employees<'a>(
        &'a self,
        manager_name: &str,
        collected: &mut Vec<&'a Member>,
        seen_emails: &mut HashSet<String>,
        visited_managers: &mut HashSet<String>,
    ) {
        if !visited_managers.insert(manager_name.to_string()) {
            return;
        }

        for entry in self.members() {
            let member = entry.member;
            if member.reviewer.as_deref() != Some(manager_name) {
                continue;
            }
            let Some(email) = member.email_identity() else {
                continue;
            };

            if member.has_designation(&Designation::Employee) {
                if seen_emails.insert(email) {
                    collected.push(member);
                }
            } else if member.has_designation(&Designation::ZonalManager) {
                self.collect_employees(&member.name, collected, seen_emails, visited_managers);
            }
        }
    }

    /// Per-manager resource counts keyed by manager name.
    pub fn manager_resources(&self) -> BTreeMap<String, usize> {
        self.managers()
            .into_iter()
            .map(|entry| {
                let count = self.employees_under(&entry.member.name).len();
                (entry.member.name.clone(), count)
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub(crate) fn member(name: &str, designation: &str, reviewer: &str, email: &str) -> Member {
        Member {
            name: name.to_string(),
            designation: Some(Designation::from(designation.to_string())),
            reviewer: if reviewer.is_empty() {
                None
            } else {
                Some(reviewer.to_string())
            },
            email: if email.is_empty() {
                None
            } else {
                Some(email.to_string())
            },
        }
    }

    /// Eng/Core: M1 (reviewed by Director) with E1, E2 and zonal Z1 who manages E3.
    /// Ops/Field: M2 (no reviewer) with E4.
    pub(crate) fn directory() -> DepartmentDirectory {
        let mut directory = DepartmentDirectory::default();
        directory.insert_member(
            "Eng",
            "Core",
            member("M1", "Reporting manager", "Director", "m1@example.com"),
        );
        directory.insert_member("Eng", "Core", member("E1", "Employee", "M1", "e1@example.com"));
        directory.insert_member("Eng", "Core", member("E2", "Employee", "M1", "e2@example.com"));
        directory.insert_member(
            "Eng",
            "Core",
            member("Z1", "Zonal Managers", "M1", "z1@example.com"),
        );
        directory.insert_member("Eng", "Core", member("E3", "Employee", "Z1", "e3@example.com"));
        directory.insert_member(
            "Ops",
            "Field",
            member("M2", "Reporting manager", "", "m2@example.com"),
        );
        directory.insert_member("Ops", "Field", member("E4", "Employee", "M2", "e4@example.com"));
        directory
    }
}
