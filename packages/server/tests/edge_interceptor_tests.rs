//! Integration tests for the edge interceptor decision logic.
//!
//! Covers the gateway's contract per request: fail-closed classification,
//! login redirects with returnTo preservation, loop prevention when the
//! identity provider is down, and session cookie rotation.

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use identity::SessionCookie;
use server_core::kernel::test_dependencies::{
    test_deps, test_identity, MockIdentityProvider, MockProfileStore,
};
use server_core::kernel::{ServerDeps, SessionLookup};
use server_core::server::build_app;
use server_core::server::middleware::{decide, EdgeDecision, EdgeOutcome};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

fn anonymous_deps() -> ServerDeps {
    test_deps(
        Arc::new(MockIdentityProvider::new()),
        Arc::new(MockProfileStore::new()),
    )
}

fn signed_in_deps() -> ServerDeps {
    let identity = test_identity(Uuid::new_v4(), "worker@example.com");
    test_deps(
        Arc::new(MockIdentityProvider::new().with_user(identity)),
        Arc::new(MockProfileStore::new()),
    )
}

fn failing_deps() -> ServerDeps {
    test_deps(
        Arc::new(MockIdentityProvider::new().with_provider_error("connection refused")),
        Arc::new(MockProfileStore::new()),
    )
}

async fn run(deps: &ServerDeps, path: &str, query: Option<&str>) -> EdgeOutcome {
    decide(deps, path, query, &HeaderMap::new())
        .await
        .expect("decision should not error")
}

// ============================================================================
// Anonymous requests
// ============================================================================

#[tokio::test]
async fn protected_paths_redirect_to_login_with_return_to() {
    let deps = anonymous_deps();

    let outcome = run(&deps, "/timesheets", Some("week=2024-01-01")).await;
    assert_eq!(
        outcome.location(),
        Some("/login?returnTo=%2Ftimesheets%3Fweek%3D2024-01-01")
    );

    let outcome = run(&deps, "/time-off/requests/42", None).await;
    assert_eq!(
        outcome.location(),
        Some("/login?returnTo=%2Ftime-off%2Frequests%2F42")
    );
}

#[tokio::test]
async fn unknown_paths_fail_closed_to_login() {
    let deps = anonymous_deps();
    let outcome = run(&deps, "/completely-unknown", None).await;
    assert_eq!(
        outcome.location(),
        Some("/login?returnTo=%2Fcompletely-unknown")
    );
}

#[tokio::test]
async fn public_paths_pass_through_unmodified() {
    let deps = anonymous_deps();
    for path in ["/", "/login", "/error", "/errors", "/health", "/test"] {
        let outcome = run(&deps, path, None).await;
        assert_eq!(outcome.decision, EdgeDecision::PassThrough, "{path}");
        assert!(outcome.rotated.is_empty());
    }
}

#[tokio::test]
async fn every_request_triggers_a_session_lookup() {
    let provider = Arc::new(MockIdentityProvider::new());
    let deps = test_deps(provider.clone(), Arc::new(MockProfileStore::new()));

    run(&deps, "/login", None).await;
    run(&deps, "/timesheets", None).await;
    run(&deps, "/health", None).await;

    assert_eq!(provider.lookup_count(), 3);
}

// ============================================================================
// Provider failures (loop prevention)
// ============================================================================

#[tokio::test]
async fn provider_failure_on_recovery_pages_passes_through() {
    let deps = failing_deps();

    // Simulate repeated failures: the redirect count must stay at zero.
    for _ in 0..5 {
        for path in ["/login", "/error", "/errors", "/auth/callback"] {
            let outcome = run(&deps, path, None).await;
            assert_eq!(outcome.decision, EdgeDecision::PassThrough, "{path}");
        }
    }
}

#[tokio::test]
async fn provider_failure_in_app_area_redirects_to_app_error_page() {
    let deps = failing_deps();
    for path in ["/dashboard", "/timesheets/2024-01-01", "/admin", "/time-off"] {
        let outcome = run(&deps, path, None).await;
        assert_eq!(outcome.location(), Some("/errors?code=auth"), "{path}");
    }
}

#[tokio::test]
async fn provider_failure_elsewhere_redirects_to_public_error_page() {
    let deps = failing_deps();
    for path in ["/", "/somewhere-else", "/health"] {
        let outcome = run(&deps, path, None).await;
        assert_eq!(outcome.location(), Some("/error?code=auth"), "{path}");
    }
}

// ============================================================================
// Auth callback
// ============================================================================

#[tokio::test]
async fn auth_callback_always_passes_through() {
    for deps in [anonymous_deps(), signed_in_deps()] {
        let outcome = run(&deps, "/auth/callback", Some("code=abc")).await;
        assert_eq!(outcome.decision, EdgeDecision::PassThrough);
    }
}

// ============================================================================
// Signed-in requests
// ============================================================================

#[tokio::test]
async fn signed_in_protected_paths_pass_through_with_identity() {
    let deps = signed_in_deps();
    let outcome = run(&deps, "/timesheets", None).await;
    assert_eq!(outcome.decision, EdgeDecision::PassThrough);
    assert!(outcome.identity.is_some());
}

#[tokio::test]
async fn signed_in_login_visit_restores_return_to_exactly() {
    let deps = signed_in_deps();
    let outcome = run(
        &deps,
        "/login",
        Some("returnTo=%2Ftimesheets%3Fweek%3D2024-01-01"),
    )
    .await;
    assert_eq!(outcome.location(), Some("/timesheets?week=2024-01-01"));
}

#[tokio::test]
async fn signed_in_login_visit_without_return_to_lands_on_dashboard() {
    let deps = signed_in_deps();
    let outcome = run(&deps, "/login", None).await;
    assert_eq!(outcome.location(), Some("/dashboard"));
}

#[tokio::test]
async fn malformed_return_to_falls_back_to_dashboard() {
    let deps = signed_in_deps();
    // %ff%fe does not percent-decode to valid UTF-8
    let outcome = run(&deps, "/login", Some("returnTo=%ff%fe")).await;
    assert_eq!(outcome.location(), Some("/dashboard"));
}

#[tokio::test]
async fn absolute_and_protocol_relative_return_to_are_rejected() {
    let deps = signed_in_deps();

    let outcome = run(
        &deps,
        "/login",
        Some("returnTo=https%3A%2F%2Fevil.example%2Fphish"),
    )
    .await;
    assert_eq!(outcome.location(), Some("/dashboard"));

    let outcome = run(&deps, "/login", Some("returnTo=%2F%2Fevil.example")).await;
    assert_eq!(outcome.location(), Some("/dashboard"));
}

// ============================================================================
// Cookie rotation
// ============================================================================

#[tokio::test]
async fn rotation_is_preserved_on_pass_through_and_redirect() {
    let identity = test_identity(Uuid::new_v4(), "worker@example.com");
    let rotated = vec![
        SessionCookie::new("sb-access-token", "new-at"),
        SessionCookie::new("sb-refresh-token", "new-rt"),
    ];
    let deps = test_deps(
        Arc::new(MockIdentityProvider::new().with_rotation(identity, rotated.clone())),
        Arc::new(MockProfileStore::new()),
    );

    // Pass-through keeps the refreshed cookies
    let outcome = run(&deps, "/timesheets", None).await;
    assert_eq!(outcome.decision, EdgeDecision::PassThrough);
    assert_eq!(outcome.rotated, rotated);

    // So does a redirect away from login
    let outcome = run(&deps, "/login", None).await;
    assert_eq!(outcome.location(), Some("/dashboard"));
    assert_eq!(outcome.rotated, rotated);
}

#[tokio::test]
async fn anonymous_login_visit_never_redirects() {
    let deps = anonymous_deps();
    let outcome = run(&deps, "/login", None).await;
    assert_eq!(outcome.decision, EdgeDecision::PassThrough);
}

#[tokio::test]
async fn one_shot_lookups_are_consumed_before_the_fallback() {
    let provider = Arc::new(MockIdentityProvider::new());
    provider.push_lookup(SessionLookup::provider_error("blip"));
    let deps = test_deps(provider, Arc::new(MockProfileStore::new()));

    // First request sees the scripted failure...
    let outcome = run(&deps, "/dashboard", None).await;
    assert_eq!(outcome.location(), Some("/errors?code=auth"));

    // ...then the provider recovers to the anonymous fallback.
    let outcome = run(&deps, "/dashboard", None).await;
    assert_eq!(outcome.location(), Some("/login?returnTo=%2Fdashboard"));
}

// ============================================================================
// Full middleware stack (through build_app)
// ============================================================================

async fn get(deps: ServerDeps, uri: &str) -> axum::response::Response {
    build_app(deps, Vec::new())
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response")
}

fn location_header(response: &axum::response::Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn lookup_failure_redirects_to_the_critical_error_page() {
    let deps = test_deps(
        Arc::new(MockIdentityProvider::new().with_lookup_failure("adapter panic surrogate")),
        Arc::new(MockProfileStore::new()),
    );

    let response = get(deps, "/dashboard").await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location_header(&response), Some("/error?code=critical"));
}

#[tokio::test]
async fn lookup_failure_on_the_error_pages_still_renders_them() {
    let deps = test_deps(
        Arc::new(MockIdentityProvider::new().with_lookup_failure("adapter panic surrogate")),
        Arc::new(MockProfileStore::new()),
    );

    // The generic error page must render even when the gate itself is
    // broken, or the browser would redirect to /error forever.
    for uri in ["/error?code=critical", "/error", "/errors?code=auth"] {
        let response = get(deps.clone(), uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(location_header(&response), None, "{uri}");
    }
}

#[tokio::test]
async fn redirects_are_temporary_307() {
    let response = get(anonymous_deps(), "/dashboard").await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location_header(&response),
        Some("/login?returnTo=%2Fdashboard")
    );
}

#[tokio::test]
async fn rotated_cookies_reach_the_response_set_cookie_headers() {
    let identity = test_identity(Uuid::new_v4(), "worker@example.com");
    let rotated = vec![
        SessionCookie::new("sb-access-token", "new-at"),
        SessionCookie::new("sb-refresh-token", "new-rt"),
    ];
    let deps = test_deps(
        Arc::new(MockIdentityProvider::new().with_rotation(identity, rotated)),
        Arc::new(MockProfileStore::new()),
    );

    let response = get(deps, "/dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies: Vec<_> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().expect("header value").to_string())
        .collect();
    assert_eq!(cookies.len(), 2);
    assert!(cookies[0].starts_with("sb-access-token=new-at; HttpOnly"));
    assert!(cookies[1].starts_with("sb-refresh-token=new-rt; HttpOnly"));
}
