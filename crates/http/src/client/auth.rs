//! Authentication API client methods

use super::request::OutboundRequest;
use super::{ClientError, SessionClient};
use crate::types::{
    AuthResponse, LoginRequest, LogoutRequest, MessageResponse, NewPasswordRequest,
    RegisterRequest, ResetTokenCheck, SendResetEmailRequest,
};
use turnstile_core::{LoginForm, NewPasswordForm, RegisterForm, SendEmailForm, Validate};

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const LOGOUT_PATH: &str = "/auth/logout";
const RESET_PASSWORD_PATH: &str = "/auth/reset-password";

impl SessionClient {
    /// Log in and store the issued pair
    pub async fn login(&self, form: &LoginForm) -> Result<AuthResponse, ClientError> {
        form.validate()?;
        let request = OutboundRequest::post(LOGIN_PATH).json(&LoginRequest::from(form))?;
        let response: AuthResponse = self.execute_public(request).await?;
        self.store_issued(&response).await;
        Ok(response)
    }

    /// Register a new account and store the issued pair
    pub async fn register(&self, form: &RegisterForm) -> Result<AuthResponse, ClientError> {
        form.validate()?;
        let request = OutboundRequest::post(REGISTER_PATH).json(&RegisterRequest::from(form))?;
        let response: AuthResponse = self.execute_public(request).await?;
        self.store_issued(&response).await;
        Ok(response)
    }

    /// Revoke the refresh token server-side.
    ///
    /// The local store is cleared only when the server acknowledges; returns
    /// whether it did.
    pub async fn logout(&self) -> Result<bool, ClientError> {
        let refresh_token = self.inner.store.refresh_token().await;
        let request = OutboundRequest::post(LOGOUT_PATH).json(&LogoutRequest { refresh_token })?;
        let ack: serde_json::Value = self.execute(request).await?;

        let acknowledged = is_truthy(&ack);
        if acknowledged {
            self.inner.store.clear().await;
            info!("Logged out");
        } else {
            warn!(response = %ack, "Logout not acknowledged, keeping local session");
        }
        Ok(acknowledged)
    }

    /// Ask the API to email a password reset link
    pub async fn send_reset_email(
        &self,
        form: &SendEmailForm,
    ) -> Result<MessageResponse, ClientError> {
        form.validate()?;
        let request =
            OutboundRequest::post(RESET_PASSWORD_PATH).json(&SendResetEmailRequest::from(form))?;
        self.execute_public(request).await
    }

    /// Check that a reset token from the email link is still valid
    pub async fn check_reset_token(&self, token: &str) -> Result<ResetTokenCheck, ClientError> {
        let request = OutboundRequest::get(RESET_PASSWORD_PATH).query("token", token);
        self.execute_public(request).await
    }

    /// Set a new password using a reset token
    pub async fn set_new_password(
        &self,
        form: &NewPasswordForm,
    ) -> Result<MessageResponse, ClientError> {
        form.validate()?;
        let request =
            OutboundRequest::put(RESET_PASSWORD_PATH).json(&NewPasswordRequest::from(form))?;
        self.execute_public(request).await
    }

    async fn store_issued(&self, response: &AuthResponse) {
        match response.credential_pair() {
            Some(pair) => self.inner.store.save(&pair).await,
            None => debug!("Response carried no complete credential pair"),
        }
    }
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}
