//! Edge interceptor: gates every request at the transport boundary.
//!
//! Runs once per incoming request, before any page logic. Classifies the
//! route, refreshes the session with the identity provider, and either
//! passes the request through or issues a redirect. The decision logic is
//! a plain async function (`decide`) so tests can drive it directly with
//! mock dependencies; the axum middleware is a thin shell around it.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use identity::{Identity, SessionCookie};

use crate::common::auth::ErrorCode;
use crate::common::routes::{
    classify, in_app_area, is_auth_callback, is_loop_safe, raw_query_param, sanitize_return_to,
    RouteClass, APP_ERROR_PATH, DEFAULT_LANDING, LOGIN_PATH, PUBLIC_ERROR_PATH, RETURN_TO_PARAM,
};
use crate::kernel::{ServerDeps, SessionLookup};

use super::cookies;

/// Authenticated user resolved by the interceptor, stored in request
/// extensions for downstream handlers.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Identity);

#[derive(Debug, Clone, PartialEq)]
pub enum EdgeDecision {
    PassThrough,
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct EdgeOutcome {
    pub decision: EdgeDecision,
    pub identity: Option<Identity>,
    pub rotated: Vec<SessionCookie>,
}

impl EdgeOutcome {
    fn pass(identity: Option<Identity>, rotated: Vec<SessionCookie>) -> Self {
        Self {
            decision: EdgeDecision::PassThrough,
            identity,
            rotated,
        }
    }

    fn redirect(location: String, rotated: Vec<SessionCookie>) -> Self {
        Self {
            decision: EdgeDecision::Redirect(location),
            identity: None,
            rotated,
        }
    }

    /// The redirect target, if any. Test helper.
    pub fn location(&self) -> Option<&str> {
        match &self.decision {
            EdgeDecision::Redirect(location) => Some(location),
            EdgeDecision::PassThrough => None,
        }
    }
}

fn error_redirect(target: &str, code: ErrorCode) -> String {
    format!("{}?code={}", target, code.as_str())
}

/// Decide what to do with one request.
///
/// `path` and `query` come from the request URI; `headers` carry the
/// session cookies. Every branch preserves any rotated cookies so a
/// refresh is never lost, whichever way the request goes.
pub async fn decide(
    deps: &ServerDeps,
    path: &str,
    query: Option<&str>,
    headers: &HeaderMap,
) -> anyhow::Result<EdgeOutcome> {
    let class = classify(path);

    // Always hit the provider, even for public routes: the one round trip
    // both authenticates the request and triggers token refresh.
    let SessionLookup {
        identity,
        error,
        rotated,
    } = deps.identity.get_current_user(headers).await?;

    if let Some(provider_error) = error {
        // A failing provider must not redirect pages that exist to report
        // or recover from exactly that failure.
        if is_loop_safe(path) {
            tracing::warn!(%path, error = %provider_error, "session lookup failed on public page, passing through");
            return Ok(EdgeOutcome::pass(None, rotated));
        }
        tracing::warn!(%path, error = %provider_error, "session lookup failed, redirecting to error page");
        let target = if in_app_area(path) {
            APP_ERROR_PATH
        } else {
            PUBLIC_ERROR_PATH
        };
        return Ok(EdgeOutcome::redirect(
            error_redirect(target, ErrorCode::Auth),
            rotated,
        ));
    }

    // The callback handler owns the code-for-session exchange and must
    // not be redirected away mid-exchange, whatever the identity state.
    if is_auth_callback(path) {
        return Ok(EdgeOutcome::pass(identity, rotated));
    }

    match (&identity, class) {
        (None, RouteClass::Protected) => {
            // Preserve the original destination across the login redirect.
            // The login page itself is public, so a returnTo can never
            // point back at it.
            let original = match query {
                Some(q) => format!("{}?{}", path, q),
                None => path.to_string(),
            };
            let location = format!(
                "{}?{}={}",
                LOGIN_PATH,
                RETURN_TO_PARAM,
                urlencoding::encode(&original)
            );
            Ok(EdgeOutcome::redirect(location, rotated))
        }
        (Some(_), _) if path == LOGIN_PATH => {
            // Already signed in: bounce away from login, restoring the
            // preserved destination when it decodes to a safe local path.
            let target = query
                .and_then(|q| raw_query_param(q, RETURN_TO_PARAM))
                .and_then(|raw| {
                    let sanitized = sanitize_return_to(raw);
                    if sanitized.is_none() {
                        tracing::warn!(%path, raw, "ignoring invalid returnTo");
                    }
                    sanitized
                })
                .unwrap_or_else(|| DEFAULT_LANDING.to_string());
            Ok(EdgeOutcome::redirect(target, rotated))
        }
        _ => Ok(EdgeOutcome::pass(identity, rotated)),
    }
}

/// Axum middleware wrapping `decide`.
///
/// Failure semantics: anything the decision or the cookie plumbing could
/// not handle is caught here, once. If the request is already for the
/// generic error page we let it render (loop guard); otherwise we
/// redirect there with a `critical` code. The requester never sees an
/// unhandled error.
pub async fn edge_interceptor(
    State(deps): State<ServerDeps>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);

    let outcome = match decide(&deps, &path, query.as_deref(), request.headers()).await {
        Ok(outcome) => outcome,
        Err(error) => {
            tracing::error!(%path, %error, phase = "decide", "edge interceptor failed");
            return critical_fallback(&path, request, next).await;
        }
    };

    if let Err(error) = cookies::apply_rotation_to_request(request.headers_mut(), &outcome.rotated)
    {
        tracing::error!(%path, %error, phase = "cookie_rotation", "edge interceptor failed");
        return critical_fallback(&path, request, next).await;
    }

    if let Some(identity) = outcome.identity.clone() {
        request.extensions_mut().insert(CurrentUser(identity));
    }

    let mut response = match &outcome.decision {
        EdgeDecision::PassThrough => next.run(request).await,
        EdgeDecision::Redirect(location) => Redirect::temporary(location).into_response(),
    };

    if let Err(error) = cookies::append_set_cookies(response.headers_mut(), &outcome.rotated) {
        // The response itself is fine; losing one rotation only costs an
        // extra refresh on the next request.
        tracing::error!(%path, %error, phase = "set_cookie", "failed to persist rotated session cookies");
    }

    response
}

async fn critical_fallback(path: &str, request: Request, next: Next) -> Response {
    if path.starts_with(PUBLIC_ERROR_PATH) {
        return next.run(request).await;
    }
    Redirect::temporary(&error_redirect(PUBLIC_ERROR_PATH, ErrorCode::Critical)).into_response()
}
