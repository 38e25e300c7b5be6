//! Route access gate tests

#![cfg(feature = "server")]

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::{Router, routing::get};
use tower::ServiceExt;
use turnstile_http::middleware::{GateDecision, RouteGateConfig, evaluate};
use turnstile_http::server::{gated, site_router};

fn app() -> Router {
    let router = Router::new()
        .route("/auth/login", get(|| async { "login" }))
        .route("/dashboard", get(|| async { "dashboard" }))
        .route("/logo.png", get(|| async { "png" }));
    gated(router, RouteGateConfig::default())
}

fn navigate(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[test]
fn test_decisions() {
    assert_eq!(evaluate("/login", None), GateDecision::Allow);
    assert_eq!(
        evaluate("/dashboard", None),
        GateDecision::Redirect("/auth/login".to_string())
    );
    assert_eq!(
        evaluate("/dashboard", Some("refresh_token=abc")),
        GateDecision::Allow
    );
    assert_eq!(
        evaluate("/dashboard", Some("access_token=abc")),
        GateDecision::Redirect("/auth/login".to_string())
    );
}

#[tokio::test]
async fn test_login_page_reachable_without_cookies() {
    let response = app().oneshot(navigate("/auth/login", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_anonymous_navigation_redirects_to_login() {
    let response = app().oneshot(navigate("/dashboard", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/auth/login");
}

#[tokio::test]
async fn test_navigation_with_refresh_cookie_allowed() {
    let response = app()
        .oneshot(navigate("/dashboard", Some("theme=dark; refresh_token=abc")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_assets_bypass_gate() {
    let response = app().oneshot(navigate("/logo.png", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_site_router_serves_files_behind_gate() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
    std::fs::create_dir(dir.path().join("login")).unwrap();
    std::fs::write(dir.path().join("login").join("index.html"), "<h1>login</h1>").unwrap();

    let router = site_router(dir.path(), RouteGateConfig::default());

    let response = router.clone().oneshot(navigate("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = router
        .clone()
        .oneshot(navigate("/", Some("refresh_token=abc")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router.clone().oneshot(navigate("/login/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(navigate("/missing.js", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
