//! Session guard: attach the access token, refresh once on auth failure

use super::SessionClient;
use super::error::ClientError;
use super::request::OutboundRequest;
use serde::de::DeserializeOwned;
use turnstile_core::settings::{DEFAULT_EXPIRED_MESSAGE, DEFAULT_MISSING_MESSAGE};

/// Why a response counts as an authentication failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// The server answered 401
    Unauthorized,
    /// The error text matched the expired-credential literal
    CredentialExpired,
    /// The error text matched the missing-credential literal
    CredentialMissing,
}

/// Server wording for expired and missing bearer credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthLiterals {
    expired: String,
    missing: String,
}

impl Default for AuthLiterals {
    fn default() -> Self {
        Self::new(DEFAULT_EXPIRED_MESSAGE, DEFAULT_MISSING_MESSAGE)
    }
}

impl AuthLiterals {
    pub fn new(expired: impl Into<String>, missing: impl Into<String>) -> Self {
        Self {
            expired: expired.into(),
            missing: missing.into(),
        }
    }

    pub fn expired(&self) -> &str {
        &self.expired
    }

    pub fn missing(&self) -> &str {
        &self.missing
    }

    /// Classify an error; `None` means it is not an auth failure
    pub fn classify(&self, err: &ClientError) -> Option<AuthFailure> {
        // Transport errors carry no server message to match against.
        if matches!(err, ClientError::Request(_)) && err.status().is_none() {
            return None;
        }

        let message = err.message();
        if message == self.expired {
            Some(AuthFailure::CredentialExpired)
        } else if message == self.missing {
            Some(AuthFailure::CredentialMissing)
        } else if err.status() == Some(401) {
            Some(AuthFailure::Unauthorized)
        } else {
            None
        }
    }

    /// Whether a failed refresh means the refresh token itself expired
    pub fn is_expired(&self, err: &ClientError) -> bool {
        err.message() == self.expired
    }
}

impl SessionClient {
    /// Send a request through the session guard and decode the response.
    ///
    /// The current access token is attached as a bearer credential. On an
    /// auth failure the credential pair is refreshed and the request is
    /// resent once. When the store already holds a newer access token than
    /// the one rejected, that token is reused without another exchange. If
    /// the refresh fails the original error is returned,
    /// and the store is cleared when the refresh token was reported expired.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        mut request: OutboundRequest,
    ) -> Result<T, ClientError> {
        // Token issued by the refresh, used even if persisting it failed
        let mut issued: Option<String> = None;

        loop {
            let token = match issued.take() {
                Some(token) => Some(token),
                None => self.inner.store.access_token().await,
            };
            debug!(
                method = %request.method,
                path = %request.path,
                authenticated = token.is_some(),
                retried = request.retried,
                "Sending guarded request"
            );

            let err = match self.send(self.build_request(&request, token.as_deref())).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let Some(failure) = self.inner.literals.classify(&err) else {
                return Err(err);
            };

            if request.retried {
                debug!(path = %request.path, ?failure, "Auth failure after retry, giving up");
                return Err(err);
            }
            request.retried = true;

            // A refresh that settled while this attempt was in flight already
            // replaced the rejected token; retry with it instead of exchanging again.
            let current = self.inner.store.access_token().await;
            if current.is_some() && current != token {
                debug!(path = %request.path, ?failure, "Access token already refreshed, retrying");
                issued = current;
                continue;
            }

            info!(path = %request.path, ?failure, "Access token rejected, refreshing");
            match self.refresh().await {
                Ok(pair) => issued = Some(pair.access_token),
                Err(refresh_err) => {
                    if self.inner.literals.is_expired(&refresh_err) {
                        warn!("Refresh token expired, clearing session");
                        self.inner.store.clear().await;
                    } else {
                        warn!(error = %refresh_err, "Token refresh failed");
                    }
                    return Err(err);
                }
            }
        }
    }
}
