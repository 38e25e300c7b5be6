//! Request and response bodies of the remote auth API

use serde::{Deserialize, Serialize};
use std::fmt;
use turnstile_core::{CredentialPair, LoginForm, NewPasswordForm, RegisterForm, SendEmailForm};

/// `POST /auth/login`
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl From<&LoginForm> for LoginRequest {
    fn from(form: &LoginForm) -> Self {
        Self {
            email: form.email.clone(),
            password: form.password.clone(),
        }
    }
}

/// `POST /auth/register`
///
/// The confirmation field is checked locally and never sent.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl From<&RegisterForm> for RegisterRequest {
    fn from(form: &RegisterForm) -> Self {
        Self {
            email: form.email.clone(),
            username: form.username.clone(),
            password: form.password.clone(),
        }
    }
}

/// Account as returned alongside a credential pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub patronymic: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

// The backend sends numeric ids from some endpoints and strings from others.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Response of login, register and refresh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AuthResponse {
    /// The issued pair, only when both tokens are present and non-empty
    pub fn credential_pair(&self) -> Option<CredentialPair> {
        match (self.access_token.as_deref(), self.refresh_token.as_deref()) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Some(CredentialPair::new(access, refresh))
            }
            _ => None,
        }
    }
}

/// `POST /auth/logout`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

/// `POST /auth/reset-password`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResetEmailRequest {
    pub email: String,
}

impl From<&SendEmailForm> for SendResetEmailRequest {
    fn from(form: &SendEmailForm) -> Self {
        Self {
            email: form.email.clone(),
        }
    }
}

/// `PUT /auth/reset-password`
#[derive(Clone, Serialize, Deserialize)]
pub struct NewPasswordRequest {
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

impl fmt::Debug for NewPasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewPasswordRequest")
            .field("token", &"<redacted>")
            .field("password", &"<redacted>")
            .field("confirm_password", &"<redacted>")
            .finish()
    }
}

impl From<&NewPasswordForm> for NewPasswordRequest {
    fn from(form: &NewPasswordForm) -> Self {
        Self {
            token: form.token.clone(),
            password: form.password.clone(),
            confirm_password: form.confirm_password.clone(),
        }
    }
}

/// Plain acknowledgement body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

/// `GET /auth/reset-password?token=`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetTokenCheck {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_debug_hides_passwords() {
        let login = LoginRequest::from(&LoginForm {
            email: "user@example.com".into(),
            password: "hunter22".into(),
        });
        let printed = format!("{login:?}");
        assert!(printed.contains("user@example.com"));
        assert!(!printed.contains("hunter22"));

        let register = RegisterRequest {
            email: "user@example.com".into(),
            username: "user".into(),
            password: "hunter22".into(),
        };
        assert!(!format!("{register:?}").contains("hunter22"));
    }

    #[test]
    fn test_auth_response_pair_requires_both_tokens() {
        let full: AuthResponse =
            serde_json::from_str(r#"{"access_token":"a","refresh_token":"r","user":{"id":7}}"#)
                .unwrap();
        assert_eq!(full.credential_pair(), Some(CredentialPair::new("a", "r")));
        assert_eq!(full.user.unwrap().id, "7");

        let partial: AuthResponse = serde_json::from_str(r#"{"access_token":"a"}"#).unwrap();
        assert_eq!(partial.credential_pair(), None);

        let empty: AuthResponse =
            serde_json::from_str(r#"{"access_token":"","refresh_token":"r"}"#).unwrap();
        assert_eq!(empty.credential_pair(), None);
    }

    #[test]
    fn test_register_request_drops_confirmation() {
        let form = RegisterForm {
            email: "user@example.com".into(),
            username: "user".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
        };
        let body = serde_json::to_value(RegisterRequest::from(&form)).unwrap();
        assert!(body.get("confirm_password").is_none());
        assert_eq!(body["username"], "user");
    }
}
