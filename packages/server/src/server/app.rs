//! Application setup and server configuration.

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::middleware::edge_interceptor;
use crate::server::routes::{
    admin_page, app_error_page, auth_callback_handler, dashboard_page, health_handler, login_page,
    not_found_page, public_error_page,
};

/// Build the Axum application router
///
/// The edge interceptor wraps every route, the fallback included: an
/// unknown path is still a protected path and still goes through the
/// same gate.
pub fn build_app(deps: ServerDeps, allowed_origins: Vec<String>) -> Router {
    let cors = if allowed_origins.is_empty() {
        // Development default - allow any origin
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE])
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/login", get(login_page))
        .route("/dashboard", get(dashboard_page))
        .route("/admin", get(admin_page))
        .route("/auth/callback", get(auth_callback_handler))
        .route("/error", get(public_error_page))
        .route("/errors", get(app_error_page))
        .fallback(not_found_page)
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn_with_state(
            deps.clone(),
            edge_interceptor,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(deps)
}
