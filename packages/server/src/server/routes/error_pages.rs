//! Fixed error pages.
//!
//! Two variants of the same page: `/error` is the generic public one,
//! `/errors` renders inside the signed-in area and links back to the
//! dashboard. Both map the `code` query parameter to a fixed
//! title/message pair; unknown codes fall back to generic copy so a
//! crafted URL can't inject content.

use axum::{extract::Query, response::Html};
use serde::Deserialize;

use crate::common::auth::ErrorCode;
use crate::common::routes::{DEFAULT_LANDING, LOGIN_PATH};

#[derive(Debug, Deserialize)]
pub struct ErrorPageParams {
    pub code: Option<String>,
}

fn render(code: ErrorCode, back_href: &str, back_label: &str) -> Html<String> {
    let (title, message) = code.page_copy();
    Html(format!(
        "<!doctype html>\n<html>\n<head><title>{title}</title></head>\n<body>\n\
         <h1>{title}</h1>\n<p>{message}</p>\n\
         <p><a href=\"{back_href}\">{back_label}</a></p>\n</body>\n</html>"
    ))
}

/// GET /error - generic error page, shown outside the signed-in area.
pub async fn public_error_page(Query(params): Query<ErrorPageParams>) -> Html<String> {
    render(
        ErrorCode::parse(params.code.as_deref()),
        LOGIN_PATH,
        "Back to sign in",
    )
}

/// GET /errors - error page variant for the signed-in area.
pub async fn app_error_page(Query(params): Query<ErrorPageParams>) -> Html<String> {
    render(
        ErrorCode::parse(params.code.as_deref()),
        DEFAULT_LANDING,
        "Back to dashboard",
    )
}
