//! Auth form input and the rules checked before anything is sent

use crate::error::{CoreError, CoreResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

static PASSWORD_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[A-Za-z0-9!@#$%^&*()_+\-=\[\]{};':"\\|,.<>/?]+$"#)
        .expect("password charset pattern is valid")
});

const PASSWORD_MIN: usize = 6;
const PASSWORD_MAX: usize = 50;
const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 30;
const NEW_PASSWORD_MIN: usize = 9;

/// Input validated before it leaves the client
pub trait Validate {
    fn validate(&self) -> CoreResult<()>;
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Validate for LoginForm {
    fn validate(&self) -> CoreResult<()> {
        validate_email(&self.email)?;
        validate_password_length(&self.password, "password")
    }
}

/// Registration input; `confirm_password` never leaves the client
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterForm")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("confirm_password", &"<redacted>")
            .finish()
    }
}

impl Validate for RegisterForm {
    fn validate(&self) -> CoreResult<()> {
        validate_email(&self.email)?;

        let username_len = self.username.chars().count();
        if username_len < USERNAME_MIN {
            return Err(CoreError::validation(
                "username",
                format!("must be at least {USERNAME_MIN} characters"),
            ));
        }
        if username_len > USERNAME_MAX {
            return Err(CoreError::validation(
                "username",
                format!("must be at most {USERNAME_MAX} characters"),
            ));
        }

        validate_password_length(&self.password, "password")?;

        if self.confirm_password.is_empty() {
            return Err(CoreError::validation(
                "confirm_password",
                "password confirmation is required",
            ));
        }
        if self.password != self.confirm_password {
            return Err(CoreError::validation(
                "confirm_password",
                "passwords do not match",
            ));
        }
        Ok(())
    }
}

/// Request for an emailed password reset link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendEmailForm {
    pub email: String,
}

impl Validate for SendEmailForm {
    fn validate(&self) -> CoreResult<()> {
        if self.email.trim().is_empty() {
            return Err(CoreError::validation("email", "email is required"));
        }
        Ok(())
    }
}

/// New password submitted with an emailed reset token
#[derive(Clone, Serialize, Deserialize)]
pub struct NewPasswordForm {
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

impl fmt::Debug for NewPasswordForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewPasswordForm")
            .field("token", &"<redacted>")
            .field("password", &"<redacted>")
            .field("confirm_password", &"<redacted>")
            .finish()
    }
}

impl Validate for NewPasswordForm {
    fn validate(&self) -> CoreResult<()> {
        if self.token.trim().is_empty() {
            return Err(CoreError::validation("token", "reset token is required"));
        }
        validate_strong_password(&self.password)?;
        if self.password != self.confirm_password {
            return Err(CoreError::validation(
                "confirm_password",
                "password and confirmation must match",
            ));
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> CoreResult<()> {
    if email.is_empty() {
        return Err(CoreError::validation("email", "email is required"));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(CoreError::validation("email", "enter a valid email address"));
    }
    Ok(())
}

fn validate_password_length(password: &str, field: &str) -> CoreResult<()> {
    let len = password.chars().count();
    if len < PASSWORD_MIN {
        return Err(CoreError::validation(
            field,
            format!("must be at least {PASSWORD_MIN} characters"),
        ));
    }
    if len > PASSWORD_MAX {
        return Err(CoreError::validation(
            field,
            format!("must be at most {PASSWORD_MAX} characters"),
        ));
    }
    Ok(())
}

/// Rules for a password chosen through the reset flow
pub fn validate_strong_password(password: &str) -> CoreResult<()> {
    let fail = |message: &str| Err(CoreError::validation("password", message));

    if password.chars().count() < NEW_PASSWORD_MIN {
        return fail("must be at least 9 characters");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return fail("must contain an uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return fail("must contain a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return fail("must contain a digit");
    }
    if password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return fail("must contain a special character");
    }
    if !PASSWORD_CHARSET_RE.is_match(password) {
        return fail("may only contain latin letters, digits and special characters");
    }
    Ok(())
}
