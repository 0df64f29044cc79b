//! Page shells the gateway redirects to.
//!
//! The real portal pages (timesheet tables, time-off forms, user admin)
//! are external collaborators; these handlers exist so redirects have
//! somewhere to land, and so the server-rendered admin path exercises the
//! same role check the client guards apply.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use identity::Identity;

use crate::common::auth::{Actor, AdminCapability, AuthError};
use crate::common::routes::{APP_ERROR_PATH, LOGIN_PATH};
use crate::kernel::ServerDeps;
use crate::server::middleware::CurrentUser;

/// GET /login
pub async fn login_page() -> Html<&'static str> {
    Html("<!doctype html><html><body><h1>Sign in</h1></body></html>")
}

/// GET /dashboard - default authenticated landing page.
pub async fn dashboard_page() -> Html<&'static str> {
    Html("<!doctype html><html><body><h1>Dashboard</h1></body></html>")
}

/// GET /admin - server-rendered admin area.
///
/// The interceptor has already required a session; this handler adds the
/// role check. Denial is expected control flow and lands on the
/// permission error page, never an exception.
pub async fn admin_page(
    State(deps): State<ServerDeps>,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    // Fail closed if the extension is somehow missing on a protected path.
    let Some(Extension(CurrentUser(identity))) = user else {
        return Redirect::temporary(LOGIN_PATH).into_response();
    };

    match admin_access(&deps, &identity).await {
        Ok(()) => {
            Html("<!doctype html><html><body><h1>Administration</h1></body></html>").into_response()
        }
        Err(error) => {
            let code = error.error_code();
            tracing::warn!(user_id = %identity.id, %error, "admin page denied");
            Redirect::temporary(&format!("{}?code={}", APP_ERROR_PATH, code.as_str()))
                .into_response()
        }
    }
}

async fn admin_access(deps: &ServerDeps, identity: &Identity) -> Result<(), AuthError> {
    let profile = deps
        .profiles
        .get_by_user_id(identity.id)
        .await
        .map_err(AuthError::InternalError)?
        .ok_or(AuthError::AuthenticationRequired)?;

    Actor::new(identity.id, profile.role)
        .can(AdminCapability::ManageUsers)
        .check()
}

/// Fallback for unrouted paths. The interceptor has already decided
/// whether the caller may see anything here at all.
pub async fn not_found_page() -> (StatusCode, Html<&'static str>) {
    (
        StatusCode::NOT_FOUND,
        Html("<!doctype html><html><body><h1>Page not found</h1></body></html>"),
    )
}
