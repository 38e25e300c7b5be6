//! Turnstile session client

pub mod auth;
pub mod error;
pub mod guard;
pub mod refresh;
pub mod request;
pub mod store;

use error::ClientError;
use guard::AuthLiterals;
use refresh::RefreshSlot;
use reqwest::{Client, ClientBuilder, header};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use store::{CredentialStore, MemoryCredentialStore};
use turnstile_core::{SessionState, Settings};

pub use guard::AuthFailure;
pub use request::OutboundRequest;

/// Session-aware API client.
///
/// Cheap to clone; clones share the credential store and the in-flight
/// refresh, so build one per process and pass it around.
#[derive(Clone)]
pub struct SessionClient {
    inner: Arc<SessionInner>,
}

pub(crate) struct SessionInner {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) store: Arc<dyn CredentialStore>,
    pub(crate) literals: AuthLiterals,
    pub(crate) refresh: RefreshSlot,
}

impl SessionClient {
    /// Create a new client with an in-memory store
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> SessionClientBuilder {
        SessionClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// The credential store backing this session
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    /// Literals used to recognise auth failures
    pub fn literals(&self) -> &AuthLiterals {
        &self.inner.literals
    }

    /// Whether a refresh token is currently held
    pub async fn state(&self) -> SessionState {
        self.inner.store.state().await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    /// Build a reqwest request from a descriptor, attaching `token` as bearer
    pub(crate) fn build_request(
        &self,
        request: &OutboundRequest,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let mut builder = self
            .inner
            .client
            .request(request.method.clone(), self.url(&request.path))
            .headers(request.headers.clone());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder
    }

    /// Send a request and decode the body, mapping error statuses
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            // Some endpoints answer with an empty body.
            let body = if body.trim().is_empty() { "null" } else { &body };
            Ok(serde_json::from_str(body)?)
        } else {
            Err(ClientError::from_status(status, &body))
        }
    }

    /// Send without credentials and without the session guard.
    ///
    /// Used for login, registration and password reset, which must not
    /// trigger a refresh when they fail.
    pub async fn execute_public<T: DeserializeOwned>(
        &self,
        request: OutboundRequest,
    ) -> Result<T, ClientError> {
        debug!(method = %request.method, path = %request.path, "Sending public request");
        self.send(self.build_request(&request, None)).await
    }
}

/// Builder for SessionClient
#[derive(Default)]
pub struct SessionClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    store: Option<Arc<dyn CredentialStore>>,
    literals: Option<AuthLiterals>,
}

impl SessionClientBuilder {
    /// Start from loaded settings: base URL, timeout and auth literals
    pub fn from_settings(settings: &Settings) -> Self {
        Self::default()
            .base_url(settings.api_url.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .literals(AuthLiterals::new(
                settings.expired_message.clone(),
                settings.missing_message.clone(),
            ))
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the credential store; defaults to an in-memory store
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Override the expired/missing credential literals
    pub fn literals(mut self, literals: AuthLiterals) -> Self {
        self.literals = Some(literals);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<SessionClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new();

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        if let Some(user_agent) = self.user_agent {
            client_builder = client_builder.user_agent(user_agent);
        } else {
            client_builder = client_builder.user_agent(concat!("turnstile/", env!("CARGO_PKG_VERSION")));
        }

        let client = client_builder.build()?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryCredentialStore::new()));

        Ok(SessionClient {
            inner: Arc::new(SessionInner {
                client,
                base_url,
                store,
                literals: self.literals.unwrap_or_default(),
                refresh: RefreshSlot::default(),
            }),
        })
    }
}
