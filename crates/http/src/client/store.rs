//! Credential storage for the session client
//!
//! Stores never fail outward: an unreadable or unwritable backing store is
//! logged and then behaves as if no session exists.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use turnstile_core::{CookiePolicy, CredentialPair, SessionState, StoredCredentials};

/// Persists the access/refresh pair between calls
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current access token, if present and not expired
    async fn access_token(&self) -> Option<String>;

    /// Current refresh token, if present and not expired
    async fn refresh_token(&self) -> Option<String>;

    /// Replace both tokens in one write
    async fn save(&self, pair: &CredentialPair);

    /// Remove both tokens
    async fn clear(&self);

    /// Session state derived from the refresh token
    async fn state(&self) -> SessionState {
        SessionState::from_refresh_token(self.refresh_token().await.as_deref())
    }
}

/// In-process store, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    policy: CookiePolicy,
    inner: RwLock<Option<StoredCredentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: CookiePolicy) -> Self {
        Self {
            policy,
            inner: RwLock::new(None),
        }
    }

    /// Create a store that already holds a pair
    pub fn with_pair(pair: &CredentialPair) -> Self {
        let policy = CookiePolicy::default();
        Self {
            policy,
            inner: RwLock::new(Some(StoredCredentials::issue(pair, policy, Utc::now()))),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn access_token(&self) -> Option<String> {
        let guard = self.inner.read().await;
        guard
            .as_ref()
            .and_then(|stored| stored.access_token_at(Utc::now()))
            .map(str::to_string)
    }

    async fn refresh_token(&self) -> Option<String> {
        let guard = self.inner.read().await;
        guard
            .as_ref()
            .and_then(|stored| stored.refresh_token_at(Utc::now()))
            .map(str::to_string)
    }

    async fn save(&self, pair: &CredentialPair) {
        let stored = StoredCredentials::issue(pair, self.policy, Utc::now());
        *self.inner.write().await = Some(stored);
    }

    async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

/// JSON file store that survives restarts
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so readers see either the old pair or the new one.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    policy: CookiePolicy,
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_policy(path, CookiePolicy::default())
    }

    pub fn with_policy(path: impl Into<PathBuf>, policy: CookiePolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Option<StoredCredentials> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Credential store unreadable");
                return None;
            }
        };

        if content.trim().is_empty() {
            return None;
        }

        match serde_json::from_str(&content) {
            Ok(stored) => Some(stored),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Credential store corrupt, ignoring");
                None
            }
        }
    }

    async fn write(&self, stored: &StoredCredentials) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_vec_pretty(stored)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;

        // Owner read/write only before the file takes the store's name
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&tmp, permissions).await?;
        }

        tokio::fs::rename(&tmp, &self.path).await
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn access_token(&self) -> Option<String> {
        self.load()
            .await
            .and_then(|stored| stored.access_token_at(Utc::now()).map(str::to_string))
    }

    async fn refresh_token(&self) -> Option<String> {
        self.load()
            .await
            .and_then(|stored| stored.refresh_token_at(Utc::now()).map(str::to_string))
    }

    async fn save(&self, pair: &CredentialPair) {
        let _guard = self.write_lock.lock().await;
        let stored = StoredCredentials::issue(pair, self.policy, Utc::now());
        if let Err(e) = self.write(&stored).await {
            warn!(path = %self.path.display(), error = %e, "Failed to persist credentials");
        }
    }

    async fn clear(&self) {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to remove credentials");
            }
        }
    }
}
