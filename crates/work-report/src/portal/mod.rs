//! Client side of the reporting backend: REST client, fetch slots, session and form checks.

pub mod api;
pub mod auth;
pub mod client;
pub mod fetcher;
pub mod session;

pub use auth::ValidationError;
pub use client::BackendClient;
pub use fetcher::{FetchOutcome, FetchSlot, ReportFetcher, ReportSource};
pub use session::{PortalContext, Role, Session, Theme, View};

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("backend request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid backend url: {0}")]
    Url(#[from] url::ParseError),
    #[error("unexpected backend payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("backend responded with {status}: {message}")]
    Api { status: u16, message: String },
    #[error("session is not authorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("not permitted: {0}")]
    Forbidden(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl PortalError {
    /// Whether the session should be dropped and the user sent back to sign in.
    ///
    /// A rejected token always qualifies; a 404 only when the signed-in account itself
    /// could not be found.
    pub fn requires_logout(&self) -> bool {
        match self {
            PortalError::Unauthorized(_) => true,
            PortalError::NotFound(resource) => resource.starts_with("auth/"),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_stale_sessions_force_logout() {
        assert!(PortalError::Unauthorized("expired".to_string()).requires_logout());
        assert!(PortalError::NotFound("auth/me".to_string()).requires_logout());
        assert!(!PortalError::NotFound("work-reports/r-1".to_string()).requires_logout());
        assert!(!PortalError::Api {
            status: 500,
            message: "down".to_string()
        }
        .requires_logout());
    }
}
