//! Request tracing middleware

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::Instrument;

/// Middleware function for request tracing
pub async fn trace_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        http.method = %method,
        http.path = %path,
        http.status_code = tracing::field::Empty,
    );

    async move {
        tracing::debug!("Processing request");
        let response = next.run(req).await;

        // Record the status code
        tracing::Span::current().record("http.status_code", response.status().as_u16());

        response
    }
    .instrument(span)
    .await
}
