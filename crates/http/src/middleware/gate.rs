//! Route access gate
//!
//! Anonymous navigations (no refresh-token cookie) to anything other than
//! the auth-flow pages are redirected to the login page. Only the presence
//! of the cookie is checked; the API validates the token itself.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use turnstile_core::{REFRESH_TOKEN_COOKIE, Settings};

/// What the gate decided for one navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(String),
}

/// Gate configuration
#[derive(Debug, Clone)]
pub struct RouteGateConfig {
    /// Redirect target for anonymous navigations
    pub login_path: String,
    /// Any path containing one of these is reachable without a session
    pub auth_paths: Vec<String>,
    /// Cookie whose presence marks a session
    pub cookie_name: String,
}

impl Default for RouteGateConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for RouteGateConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            login_path: settings.login_path.clone(),
            auth_paths: settings.auth_paths.clone(),
            cookie_name: REFRESH_TOKEN_COOKIE.to_string(),
        }
    }
}

impl RouteGateConfig {
    /// Decide whether a navigation to `path` may proceed.
    ///
    /// `cookies` is the raw `Cookie` header value, if any.
    pub fn evaluate(&self, path: &str, cookies: Option<&str>) -> GateDecision {
        if self.auth_paths.iter().any(|auth| path.contains(auth.as_str())) {
            return GateDecision::Allow;
        }

        match cookies.and_then(|c| get_cookie(c, &self.cookie_name)) {
            Some(_) => GateDecision::Allow,
            None => GateDecision::Redirect(self.login_path.clone()),
        }
    }
}

/// Decide with the default configuration
pub fn evaluate(path: &str, cookies: Option<&str>) -> GateDecision {
    RouteGateConfig::default().evaluate(path, cookies)
}

/// Find a non-empty cookie value in a `Cookie` header
pub fn get_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}

/// Static build output and file downloads skip the gate
pub fn is_asset_path(path: &str) -> bool {
    if path.starts_with("/api") || path.starts_with("/trpc") {
        return false;
    }
    if path.starts_with("/_next") {
        return true;
    }

    let last = path.rsplit('/').next().unwrap_or_default();
    match last.rsplit_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty()
                && !ext.is_empty()
                && ext.chars().all(|c| c.is_alphanumeric() || c == '_')
        }
        None => false,
    }
}

fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join("; "))
    }
}

/// Middleware applying the gate to every non-asset request
pub async fn route_gate_middleware(
    State(config): State<Arc<RouteGateConfig>>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();

    if is_asset_path(&path) {
        return next.run(req).await;
    }

    let cookies = cookie_header(req.headers());
    match config.evaluate(&path, cookies.as_deref()) {
        GateDecision::Allow => next.run(req).await,
        GateDecision::Redirect(to) => {
            debug!(path = %path, to = %to, "Anonymous navigation redirected");
            Redirect::to(&to).into_response()
        }
    }
}
