use super::api::{
    ChangePasswordRequest, LoginRequest, PasswordResetRequest, ResetPasswordRequest,
    SignupRequest,
};
use super::session::Role;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Form problems caught before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("`{0}` is not a valid email address")]
    InvalidEmail(String),
    #[error("password must be at least {min} characters long")]
    PasswordTooShort { min: usize },
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("new password must differ from the current one")]
    PasswordUnchanged,
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Loose shape check: one `@`, something before it and a dotted domain after it.
fn email(value: &str) -> Result<String, ValidationError> {
    let email = required(value, "email")?;
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(ValidationError::InvalidEmail(email))
    }
}

fn new_password(password: &str, confirmation: &str) -> Result<String, ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingField("password"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(password.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginRequest, ValidationError> {
        if self.password.is_empty() {
            return Err(ValidationError::MissingField("password"));
        }
        Ok(LoginRequest {
            email: email(&self.email)?,
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub department: String,
    pub team: String,
}

impl SignupForm {
    /// Self-service accounts are always created with the employee role.
    pub fn validate(&self) -> Result<SignupRequest, ValidationError> {
        Ok(SignupRequest {
            name: required(&self.name, "name")?,
            email: email(&self.email)?,
            password: new_password(&self.password, &self.confirm_password)?,
            role: Role::Employee,
            department: required(&self.department, "department")?,
            team: required(&self.team, "team")?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl ChangePasswordForm {
    pub fn validate(&self) -> Result<ChangePasswordRequest, ValidationError> {
        if self.current_password.is_empty() {
            return Err(ValidationError::MissingField("current password"));
        }
        let new_password = new_password(&self.new_password, &self.confirm_password)?;
        if new_password == self.current_password {
            return Err(ValidationError::PasswordUnchanged);
        }
        Ok(ChangePasswordRequest {
            current_password: self.current_password.clone(),
            new_password,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResetPasswordForm {
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl ResetPasswordForm {
    pub fn validate(&self) -> Result<ResetPasswordRequest, ValidationError> {
        Ok(ResetPasswordRequest {
            token: required(&self.token, "reset token")?,
            new_password: new_password(&self.new_password, &self.confirm_password)?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PasswordResetForm {
    pub email: String,
}

impl PasswordResetForm {
    pub fn validate(&self) -> Result<PasswordResetRequest, ValidationError> {
        Ok(PasswordResetRequest {
            email: email(&self.email)?,
        })
    }
}
