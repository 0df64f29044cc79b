//! Auth callback: exchanges the provider's one-time code for a session.
//!
//! The edge interceptor always passes this path through untouched; the
//! handler owns the whole flow, including its failure redirects.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::common::auth::ErrorCode;
use crate::common::routes::{is_safe_return_target, DEFAULT_LANDING, PUBLIC_ERROR_PATH};
use crate::kernel::ServerDeps;
use crate::server::middleware::cookies;

#[derive(Debug, Deserialize)]
pub struct AuthCallbackParams {
    pub code: Option<String>,
    /// Destination preserved across the sign-in round trip. Already
    /// percent-decoded by the query extractor.
    #[serde(rename = "returnTo")]
    pub return_to: Option<String>,
}

fn error_redirect(code: ErrorCode) -> Response {
    Redirect::temporary(&format!("{}?code={}", PUBLIC_ERROR_PATH, code.as_str())).into_response()
}

/// GET /auth/callback
pub async fn auth_callback_handler(
    State(deps): State<ServerDeps>,
    Query(params): Query<AuthCallbackParams>,
) -> Response {
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        tracing::warn!("auth callback hit without a code");
        return error_redirect(ErrorCode::NoAuthCode);
    };

    let lookup = match deps.identity.exchange_code(&code).await {
        Ok(lookup) => lookup,
        Err(error) => {
            tracing::error!(%error, "code exchange failed");
            return error_redirect(ErrorCode::AuthFailed);
        }
    };

    let Some(identity) = lookup.identity else {
        tracing::warn!(error = ?lookup.error, "provider rejected auth code");
        return error_redirect(ErrorCode::AuthFailed);
    };

    let target = params
        .return_to
        .filter(|t| is_safe_return_target(t))
        .unwrap_or_else(|| DEFAULT_LANDING.to_string());

    tracing::info!(user_id = %identity.id, "sign-in completed");
    let mut response = Redirect::temporary(&target).into_response();
    if let Err(error) = cookies::append_set_cookies(response.headers_mut(), &lookup.rotated) {
        tracing::error!(%error, "failed to set session cookies after exchange");
        return error_redirect(ErrorCode::AuthFailed);
    }
    response
}
