//! Gated static-site server
//!
//! Serves a built frontend directory with every page navigation passing
//! through the route gate.

use crate::error::{HttpError, Result};
use crate::middleware::{RouteGateConfig, route_gate_middleware, trace_middleware};
use axum::{Router, handler::HandlerWithoutStateExt, http::Uri, middleware};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

async fn not_found(uri: Uri) -> HttpError {
    HttpError::NotFound(uri.path().to_string())
}

/// Gate an existing router
pub fn gated<S>(router: Router<S>, config: RouteGateConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(
        Arc::new(config),
        route_gate_middleware,
    ))
}

/// Router serving `dir` behind the gate, with request tracing outermost
pub fn site_router(dir: impl AsRef<Path>, config: RouteGateConfig) -> Router {
    let files = ServeDir::new(dir.as_ref())
        .append_index_html_on_directories(true)
        .not_found_service(not_found.into_service());

    gated(Router::new().fallback_service(files), config)
        .layer(middleware::from_fn(trace_middleware))
}

/// Bind `addr` and serve the gated site until `shutdown` resolves
pub async fn serve<F>(
    addr: &str,
    dir: impl AsRef<Path>,
    config: RouteGateConfig,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(HttpError::InvalidConfiguration(format!(
            "not a directory: {}",
            dir.display()
        )));
    }

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| HttpError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    info!(
        addr = %listener.local_addr()?,
        dir = %dir.display(),
        login_path = %config.login_path,
        "Serving gated site"
    );

    axum::serve(listener, site_router(dir, config))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server stopped");
    Ok(())
}
