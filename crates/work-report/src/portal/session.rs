use super::api::{TokenResponse, UserProfile};
use super::client::BackendClient;
use super::PortalError;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};
use tracing::{info, warn};

/// Account role as stored by the backend. Unknown roles get employee rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Employee,
    Manager,
    Admin,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    /// Managers and administrators may edit and delete submitted reports.
    pub fn is_manager(self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }

    pub fn can_access(self, view: View) -> bool {
        match view {
            View::SubmitReport | View::MyReports | View::UserSummary | View::ChangePassword => true,
            View::TeamReports | View::SummaryReport | View::QuickSummary | View::Attendance => {
                self.is_manager()
            }
            View::UserAdmin => self == Role::Admin,
        }
    }

    /// Navigation entries shown to this role, in menu order.
    pub fn views(self) -> Vec<View> {
        View::ALL
            .into_iter()
            .filter(|view| self.can_access(*view))
            .collect()
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "manager" => Role::Manager,
            "admin" => Role::Admin,
            _ => Role::Employee,
        }
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.label().to_string()
    }
}

/// Screens of the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    SubmitReport,
    MyReports,
    UserSummary,
    TeamReports,
    SummaryReport,
    QuickSummary,
    Attendance,
    UserAdmin,
    ChangePassword,
}

impl View {
    pub const ALL: [View; 9] = [
        View::SubmitReport,
        View::MyReports,
        View::UserSummary,
        View::TeamReports,
        View::SummaryReport,
        View::QuickSummary,
        View::Attendance,
        View::UserAdmin,
        View::ChangePassword,
    ];

    pub fn label(self) -> &'static str {
        match self {
            View::SubmitReport => "Submit Report",
            View::MyReports => "My Reports",
            View::UserSummary => "My Summary",
            View::TeamReports => "Team Reports",
            View::SummaryReport => "Summary Report",
            View::QuickSummary => "Quick Summary",
            View::Attendance => "Attendance",
            View::UserAdmin => "User Administration",
            View::ChangePassword => "Change Password",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

impl Session {
    pub fn role(&self) -> Role {
        self.user.role
    }
}

/// Application-wide auth and theme state, shared for the lifetime of the app root.
#[derive(Debug, Default)]
pub struct PortalContext {
    session: RwLock<Option<Session>>,
    theme: RwLock<Theme>,
}

impl PortalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.session().map(|session| session.user)
    }

    pub fn role(&self) -> Option<Role> {
        self.session().map(|session| session.role())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn login(&self, response: TokenResponse) -> Session {
        let session = Session {
            token: response.access_token,
            user: response.user,
        };
        info!(email = %session.user.email, role = session.role().label(), "signed in");
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        session
    }

    pub fn logout(&self) {
        let previous = self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(session) = previous {
            info!(email = %session.user.email, "signed out");
        }
    }

    pub fn theme(&self) -> Theme {
        *self.theme.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn toggle_theme(&self) -> Theme {
        let mut theme = self.theme.write().unwrap_or_else(PoisonError::into_inner);
        *theme = theme.toggled();
        *theme
    }

    pub fn can_view(&self, view: View) -> bool {
        self.role().map_or(false, |role| role.can_access(view))
    }

    /// Role of the signed-in user if they may open `view`.
    pub fn require(&self, view: View) -> Result<Role, PortalError> {
        let role = self
            .role()
            .ok_or_else(|| PortalError::Unauthorized("sign in required".to_string()))?;
        if role.can_access(view) {
            Ok(role)
        } else {
            Err(PortalError::Forbidden(format!(
                "{} is not available to {} accounts",
                view.label(),
                role.label()
            )))
        }
    }

    /// A copy of `client` carrying the session's bearer token.
    pub fn authorized(&self, client: &BackendClient) -> Result<BackendClient, PortalError> {
        let session = self
            .session()
            .ok_or_else(|| PortalError::Unauthorized("sign in required".to_string()))?;
        Ok(client.clone().with_token(session.token))
    }

    /// Passes `result` through, dropping the session when the error means it is stale.
    pub fn guard<T>(&self, result: Result<T, PortalError>) -> Result<T, PortalError> {
        if let Err(err) = &result {
            if err.requires_logout() {
                warn!(error = %err, "session rejected by backend, signing out");
                self.logout();
            }
        }
        result
    }
}
