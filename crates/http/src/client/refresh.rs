//! Refresh-token exchange
//!
//! Concurrent callers share one in-flight exchange: the first caller starts
//! it, later callers await the same shared future, and the slot is emptied
//! when the exchange settles.

use super::error::ClientError;
use super::request::OutboundRequest;
use super::{SessionClient, SessionInner};
use crate::types::AuthResponse;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::Arc;
use tokio::sync::Mutex;
use turnstile_core::CredentialPair;

/// Remote endpoint exchanging a refresh token for a new pair
pub const REFRESH_PATH: &str = "/auth/refresh";

type RefreshFuture = Shared<BoxFuture<'static, Result<CredentialPair, ClientError>>>;

/// Holds the exchange currently in flight, if any
#[derive(Default)]
pub(crate) struct RefreshSlot {
    in_flight: Mutex<Option<RefreshFuture>>,
}

impl SessionClient {
    /// Exchange the stored refresh token for a new credential pair.
    ///
    /// Fails with [`ClientError::NoRefreshToken`] without touching the
    /// network when no refresh token is held. Upstream failures are
    /// returned unchanged.
    pub async fn refresh(&self) -> Result<CredentialPair, ClientError> {
        let exchange = {
            let mut slot = self.inner.refresh.in_flight.lock().await;
            match slot.as_ref() {
                Some(existing) => {
                    debug!("Joining in-flight token refresh");
                    existing.clone()
                }
                None => {
                    let exchange = run_exchange(self.clone()).boxed().shared();
                    *slot = Some(exchange.clone());
                    exchange
                }
            }
        };

        exchange.await
    }
}

async fn run_exchange(client: SessionClient) -> Result<CredentialPair, ClientError> {
    let result = exchange(&client).await;
    release(&client.inner).await;
    result
}

async fn release(inner: &Arc<SessionInner>) {
    inner.refresh.in_flight.lock().await.take();
}

async fn exchange(client: &SessionClient) -> Result<CredentialPair, ClientError> {
    let Some(refresh_token) = client.inner.store.refresh_token().await else {
        debug!("No refresh token held, skipping exchange");
        return Err(ClientError::NoRefreshToken);
    };

    let request = OutboundRequest::post(REFRESH_PATH).json_value(serde_json::json!({}));
    let response: AuthResponse = client
        .send(client.build_request(&request, Some(&refresh_token)))
        .await?;

    let pair = response.credential_pair().ok_or_else(|| {
        ClientError::InvalidResponse("refresh response is missing a token".into())
    })?;

    client.inner.store.save(&pair).await;
    info!("Credential pair refreshed");
    Ok(pair)
}
