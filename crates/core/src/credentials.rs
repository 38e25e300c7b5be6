//! Credential pair, session state and cookie lifetimes

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cookie holding the short-lived access token
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Cookie holding the long-lived refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Access and refresh tokens issued together by the API.
///
/// A pair is always written and replaced as a unit.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

// Tokens are bearer secrets; keep them out of logs.
impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Session state derived from which credentials are present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No refresh token
    Anonymous,
    /// Refresh token present; the access token may be stale or absent
    Authenticated,
}

impl SessionState {
    pub fn from_refresh_token(refresh_token: Option<&str>) -> Self {
        match refresh_token {
            Some(token) if !token.is_empty() => Self::Authenticated,
            _ => Self::Anonymous,
        }
    }

    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Authenticated => write!(f, "authenticated"),
        }
    }
}

/// How long each credential is kept before it reads as absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            access_ttl: Duration::days(1),
            refresh_ttl: Duration::days(30),
        }
    }
}

/// Persisted form of a credential pair with cookie-style expiry
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredCredentials {
    pub fn issue(pair: &CredentialPair, policy: CookiePolicy, now: DateTime<Utc>) -> Self {
        Self {
            access_token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
            access_expires_at: now + policy.access_ttl,
            refresh_expires_at: now + policy.refresh_ttl,
            updated_at: now,
        }
    }

    /// Access token, unless its cookie lifetime has passed
    pub fn access_token_at(&self, now: DateTime<Utc>) -> Option<&str> {
        (self.access_expires_at > now).then_some(self.access_token.as_str())
    }

    /// Refresh token, unless its cookie lifetime has passed
    pub fn refresh_token_at(&self, now: DateTime<Utc>) -> Option<&str> {
        (self.refresh_expires_at > now).then_some(self.refresh_token.as_str())
    }
}

impl fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("access_expires_at", &self.access_expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .field("updated_at", &self.updated_at)
            .finish_non_exhaustive()
    }
}
