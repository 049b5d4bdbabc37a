//! Request and response bodies of the reporting backend's REST contract.

use crate::portal::session::Role;
use crate::reports::aggregate::AttendanceCounts;
use crate::reports::directory::DepartmentDirectory;
use crate::reports::domain::{StatusCatalog, WorkReport};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentsResponse {
    pub departments: DepartmentDirectory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusOptionsResponse {
    pub status_options: StatusCatalog,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkReportsResponse {
    #[serde(default)]
    pub reports: Vec<WorkReport>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReportResponse {
    pub message: String,
    pub report_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManagerResourcesResponse {
    pub manager_resources: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceResponse {
    pub date: NaiveDate,
    #[serde(default)]
    pub attendance_summary: BTreeMap<String, AttendanceCounts>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerContact {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManagersListResponse {
    #[serde(default)]
    pub managers: Vec<ManagerContact>,
}

/// Signed-in account as returned by `/auth/login` and `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub team: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
    pub user: UserProfile,
}

fn bearer() -> String {
    "bearer".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub department: String,
    pub team: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}
