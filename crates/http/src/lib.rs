//! Turnstile HTTP layer
//!
//! The `client` feature provides the session client: credential stores,
//! the guarded request path and the token refresh exchange. The `server`
//! feature provides the route access gate and a gated static-site router.

#[cfg(any(feature = "client", feature = "server"))]
#[macro_use]
extern crate tracing;

pub mod error;
pub mod types;

#[cfg(feature = "server")]
pub mod middleware;
#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "client")]
pub mod client;

pub use error::{HttpError, Result};

#[cfg(feature = "client")]
pub use client::{
    AuthFailure, OutboundRequest, SessionClient, SessionClientBuilder,
    error::ClientError,
    guard::AuthLiterals,
    store::{CredentialStore, FileCredentialStore, MemoryCredentialStore},
};
#[cfg(feature = "server")]
pub use middleware::{GateDecision, RouteGateConfig};
