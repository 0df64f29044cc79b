//! Route classification for the authorization gateway.
//!
//! The classification is a total function over all paths: anything not on
//! the public allowlist is protected. An unknown path must never fall
//! open.

/// Sign-in page. Public.
pub const LOGIN_PATH: &str = "/login";
/// Where an authenticated user lands when we have nowhere better to send them.
pub const DEFAULT_LANDING: &str = "/dashboard";
/// Generic error page shown outside the signed-in area.
pub const PUBLIC_ERROR_PATH: &str = "/error";
/// Error page variant rendered inside the signed-in shell.
pub const APP_ERROR_PATH: &str = "/errors";
/// One-time-code exchange endpoint. Owns its own flow; never redirected.
pub const AUTH_CALLBACK_PREFIX: &str = "/auth/callback";
/// Query parameter that preserves the original destination across login.
pub const RETURN_TO_PARAM: &str = "returnTo";

/// Paths that never require a session.
const PUBLIC_PATHS: &[&str] = &[
    "/",
    LOGIN_PATH,
    PUBLIC_ERROR_PATH,
    APP_ERROR_PATH,
    "/health",
    "/test",
];

/// Top-level prefixes that serve signed-in features. Used to pick the
/// error-page variant, not to decide protection (protection is the
/// default).
const APP_AREA_PREFIXES: &[&str] = &[
    "/dashboard",
    "/profile",
    "/admin",
    "/time-off",
    "/timesheets",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected,
}

/// Classify a request path. Total and fail-closed: unclassified paths are
/// protected.
pub fn classify(path: &str) -> RouteClass {
    if PUBLIC_PATHS.contains(&path) || is_auth_callback(path) {
        RouteClass::Public
    } else {
        RouteClass::Protected
    }
}

pub fn is_auth_callback(path: &str) -> bool {
    path.starts_with(AUTH_CALLBACK_PREFIX)
}

/// Pages where a failing identity provider must NOT trigger a redirect,
/// or the browser would bounce between the provider error and the page
/// meant to report it.
pub fn is_loop_safe(path: &str) -> bool {
    path == LOGIN_PATH || path.starts_with(PUBLIC_ERROR_PATH) || is_auth_callback(path)
}

/// Whether the path belongs to the signed-in application area (including
/// nested paths).
pub fn in_app_area(path: &str) -> bool {
    APP_AREA_PREFIXES
        .iter()
        .any(|prefix| path == *prefix || path.starts_with(&format!("{}/", prefix)))
}

/// Pull a raw (still percent-encoded) query parameter out of a query
/// string. We keep the value raw so that decode failures stay observable.
pub fn raw_query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query.split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        if parts.next()? == name {
            Some(parts.next().unwrap_or(""))
        } else {
            None
        }
    })
}

/// Validate a decoded redirect target: must be a same-origin absolute
/// path. Rejects protocol-relative (`//evil`) and absolute
/// (`https://evil`) URLs so a crafted returnTo can never become an open
/// redirect.
pub fn is_safe_return_target(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.contains("://")
        && !target.contains('\\')
}

/// Decode and validate a raw returnTo value. `None` means the caller
/// falls back to the default landing page.
pub fn sanitize_return_to(raw: &str) -> Option<String> {
    let decoded = urlencoding::decode(raw).ok()?.into_owned();
    if is_safe_return_target(&decoded) {
        Some(decoded)
    } else {
        None
    }
}
